//! Commands for interactive mode

mod stats;
mod summary;

pub use stats::StatsCommand;
pub use summary::SummaryCommand;

use parley_agent::Agent;
use parley_ai::ProviderKind;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Summarize older history now
    Compress,
    /// Show a message to the user (not sent to agent)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a command.
///
/// Accepts `/name args` and the bare words `exit`, `quit`, `summary`,
/// `clear` and `stats`. Anything else is a chat message and yields `None`.
pub fn execute_command(input: &str, agent: &Agent, kind: ProviderKind) -> Option<CommandResult> {
    let input = input.trim();

    let command = match input.strip_prefix('/') {
        Some(rest) => rest.split_whitespace().next().unwrap_or("").to_lowercase(),
        None => match input.to_lowercase().as_str() {
            bare @ ("exit" | "quit" | "summary" | "clear" | "stats") => bare.to_string(),
            _ => return None,
        },
    };

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "summary" => SummaryCommand::execute(agent),

        "stats" | "s" => StatsCommand::execute(agent, kind),

        "compress" => CommandResult::Compress,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /summary             Show the summary of compressed history
  /stats, /s           Show token usage and estimated cost
  /compress            Summarize older history now
  /clear, /c           Clear conversation history and token counts
  /quit, /exit, /q     Exit parley

The words exit, quit, summary, clear and stats work without the slash."#
        .to_string()
}
