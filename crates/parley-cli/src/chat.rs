//! Interactive chat loop

use std::io::{BufRead, Write};

use parley_agent::{Agent, TurnResult};
use parley_ai::ProviderKind;

use crate::commands::{self, CommandResult};

/// Print the reply and token accounting for one finished turn
pub fn report_turn(out: &mut impl Write, agent: &Agent, result: &TurnResult) -> std::io::Result<()> {
    writeln!(out, "Assistant: {}", result.text)?;
    writeln!(out)?;
    if result.was_compressed {
        writeln!(out, "[COMPRESSED: conversation summary created]")?;
    }
    writeln!(
        out,
        "Tokens this turn: {} | Cumulative: {}",
        result.turn_total_tokens, result.total_tokens
    )?;
    if agent.summary().is_some() {
        writeln!(
            out,
            "(Storing {} recent messages, older context in summary)",
            agent.message_count()
        )?;
    }
    if agent.is_approaching_limit() {
        writeln!(
            out,
            "Warning: {}% of the {} token budget used. Consider clearing history.",
            agent.token_percentage(),
            agent.config().compression.warn_threshold
        )?;
    }
    Ok(())
}

/// Read lines from `input` until EOF or an exit command, sending each
/// non-command line to the agent.
///
/// A failed turn is reported and the loop goes on; sending the same text
/// again retries it.
pub async fn run_interactive(
    agent: &mut Agent,
    kind: ProviderKind,
    mut input: impl BufRead,
    mut out: impl Write,
) -> anyhow::Result<()> {
    writeln!(
        out,
        "parley ({}) session: {}. Type /help for commands.",
        agent.config().options.model_or_default(kind),
        agent.session()
    )?;
    if agent.message_count() > 0 {
        writeln!(out, "Resumed with {} stored messages.", agent.message_count())?;
    }
    writeln!(out)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(line, agent, kind) {
            match result {
                CommandResult::Clear => {
                    agent.clear_history()?;
                    writeln!(out, "[History cleared]")?;
                }
                CommandResult::Compress => match agent.compress().await {
                    Ok(true) => writeln!(
                        out,
                        "[COMPRESSED: conversation summary created] {} messages kept.",
                        agent.message_count()
                    )?,
                    Ok(false) => writeln!(out, "Nothing to compress yet.")?,
                    Err(e) => writeln!(out, "Compression failed: {}", e)?,
                },
                CommandResult::Message(msg) => writeln!(out, "{}", msg)?,
                CommandResult::Exit => break,
                CommandResult::Unknown(cmd) => {
                    writeln!(out, "Unknown command: /{}", cmd)?;
                    writeln!(out, "Type /help for available commands.")?;
                }
            }
            writeln!(out)?;
            continue;
        }

        match agent.run(line).await {
            Ok(result) => report_turn(&mut out, agent, &result)?,
            Err(e) => {
                tracing::debug!("Turn failed: {:?}", e);
                writeln!(out, "Error: {}", e)?;
                if e.is_transport() {
                    writeln!(out, "Send the same message again to retry.")?;
                }
            }
        }
        writeln!(out)?;
    }

    Ok(())
}
