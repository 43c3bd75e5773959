//! Scripted conversations showing compression at work

use std::io::Write;

use parley_agent::{Agent, CompressionPolicy};
use parley_ai::RequestOptions;

use crate::chat::report_turn;

/// A scripted conversation
pub struct DemoCase {
    pub name: &'static str,
    pub compression: bool,
    /// Reply length cap for this case, overriding the configured one
    pub max_tokens: Option<u32>,
    pub turns: &'static [&'static str],
}

const SPACE_TURNS: &[&str] = &[
    "Tell me a fun fact about space",
    "What else is interesting about planets?",
    "How do astronauts train for space?",
    "What about their diet in space?",
    "How do they communicate with Earth?",
    "What happens to their muscles in zero gravity?",
    "Can they sleep in space?",
    "What about weather in space?",
    "What is a black hole?",
    "Can we travel through black holes?",
];

pub const DEMO_CASES: &[DemoCase] = &[
    DemoCase {
        name: "Long multi-turn conversation with compression",
        compression: true,
        max_tokens: None,
        turns: SPACE_TURNS,
    },
    DemoCase {
        name: "Short conversation (compression not triggered)",
        compression: true,
        max_tokens: None,
        turns: &["What is Python?", "What is PHP?", "What is JavaScript?"],
    },
    DemoCase {
        name: "Long multi-turn conversation without compression",
        compression: false,
        max_tokens: None,
        turns: SPACE_TURNS,
    },
    DemoCase {
        name: "Verbose responses",
        compression: true,
        max_tokens: Some(500),
        turns: &[
            "Explain how the internet works in detail",
            "Tell me about the history of programming",
            "Describe cloud computing comprehensively",
        ],
    },
];

/// Session id a case runs under
pub fn session_for(number: usize) -> String {
    format!("demo_case{}", number)
}

/// Run one case from a clean slate. `number` is 1-based and only used for
/// display.
///
/// Stops at the first failed turn.
pub async fn run_case(
    agent: &mut Agent,
    number: usize,
    case: &DemoCase,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if !case.compression {
        let policy = CompressionPolicy {
            enabled: false,
            ..agent.config().compression.clone()
        };
        agent.set_compression_policy(policy);
    }
    if let Some(max_tokens) = case.max_tokens {
        let options = RequestOptions {
            max_tokens: Some(max_tokens),
            ..agent.config().options.clone()
        };
        agent.set_options(options);
    }
    agent.clear_history()?;

    writeln!(out, "=== Case {}: {} ===", number, case.name)?;
    writeln!(
        out,
        "Compression: {}",
        if agent.config().compression.enabled { "enabled" } else { "disabled" }
    )?;
    writeln!(out)?;

    for (i, turn) in case.turns.iter().enumerate() {
        writeln!(out, "Turn {} - You: {}", i + 1, turn)?;
        let result = agent.run(turn).await?;
        report_turn(out, agent, &result)?;
        writeln!(out)?;
    }

    let stats = agent.stats();
    writeln!(out, "--- Case {} complete ---", number)?;
    writeln!(
        out,
        "Total tokens: {} (input {}, output {}), summaries: {}",
        stats.total(),
        stats.total_input,
        stats.total_output,
        stats.compression_total()
    )?;
    match agent.summary() {
        Some(summary) => writeln!(out, "Final summary: {}", summary)?,
        None => writeln!(out, "No summary was needed.")?,
    }
    writeln!(out)?;

    Ok(())
}
