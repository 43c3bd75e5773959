//! /summary command - show the compressed context

use super::CommandResult;
use parley_agent::Agent;

pub struct SummaryCommand;

impl SummaryCommand {
    pub fn execute(agent: &Agent) -> CommandResult {
        let output = match agent.summary() {
            Some(summary) => format!(
                "[Compressed Context Summary]\n{}\n\n({} recent messages kept verbatim)",
                summary,
                agent.message_count()
            ),
            None => "[No compression yet - full history is being used]".to_string(),
        };
        CommandResult::Message(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{agent, agent_with};
    use parley_agent::ConversationState;
    use parley_ai::Message;

    #[test]
    fn test_no_summary_yet() {
        assert_eq!(
            SummaryCommand::execute(&agent()),
            CommandResult::Message("[No compression yet - full history is being used]".into())
        );
    }

    #[test]
    fn test_shows_summary() {
        let agent = agent_with(ConversationState::new(
            vec![Message::user("and Saturn?"), Message::assistant("It has rings.")],
            Some("The user asked about Jupiter.".into()),
        ));

        let CommandResult::Message(text) = SummaryCommand::execute(&agent) else {
            panic!("expected a message");
        };
        assert!(text.starts_with("[Compressed Context Summary]\nThe user asked about Jupiter."));
        assert!(text.contains("(2 recent messages"));
    }
}
