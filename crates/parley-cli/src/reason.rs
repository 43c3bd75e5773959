//! Ask the same puzzle with different prompting strategies and rank the
//! replies by how much detail they give

use std::io::Write;

use futures::future::join_all;
use parley_agent::Gateway;
use parley_ai::{Completion, Message, RequestOptions};

pub const DEFAULT_PUZZLE: &str = "A farmer needs to cross a river with a fox, chicken, and grain. \
The boat holds only the farmer + one item. Fox eats chicken, chicken eats grain if left alone. \
How does the farmer solve this?";

/// A way of wrapping the puzzle into a prompt
pub struct Strategy {
    pub name: &'static str,
    build: fn(&str) -> String,
}

impl Strategy {
    pub fn prompt(&self, puzzle: &str) -> String {
        (self.build)(puzzle)
    }
}

pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "Direct",
        build: |puzzle| puzzle.to_string(),
    },
    Strategy {
        name: "Step-by-step",
        build: |puzzle| format!("{puzzle}\n\nSolve this step by step, explaining each decision."),
    },
    Strategy {
        name: "Prompt generation",
        build: |puzzle| {
            format!(
                "Create a detailed prompt that would help someone solve this puzzle: {puzzle}\n\n\
                 Generate the prompt, then solve the puzzle using that prompt as guidance."
            )
        },
    },
    Strategy {
        name: "Expert group",
        build: |puzzle| {
            format!(
                "You are three experts discussing a puzzle. Each gives their solution:\n\n\
                 ANALYST: Analyze the constraints and logical requirements.\n\
                 ENGINEER: Propose a step-by-step solution.\n\
                 CRITIC: Review and validate the solution.\n\n\
                 Puzzle: {puzzle}\n\n\
                 Each expert should provide their viewpoint."
            )
        },
    },
];

/// Reply to one strategy's prompt
pub struct StrategyRun {
    pub name: &'static str,
    pub result: parley_ai::Result<Completion>,
}

/// Send every strategy's prompt concurrently, in `STRATEGIES` order
pub async fn run_all(gateway: &dyn Gateway, puzzle: &str, options: &RequestOptions) -> Vec<StrategyRun> {
    let runs = STRATEGIES.iter().map(|strategy| async move {
        let messages = [Message::user(strategy.prompt(puzzle))];
        StrategyRun {
            name: strategy.name,
            result: gateway.send(&messages, options).await,
        }
    });
    join_all(runs).await
}

/// Successful strategies with their reply length in characters, longest
/// first
pub fn ranking(runs: &[StrategyRun]) -> Vec<(&'static str, usize)> {
    let mut lengths: Vec<(&'static str, usize)> = runs
        .iter()
        .filter_map(|run| {
            run.result
                .as_ref()
                .ok()
                .map(|c| (run.name, c.text.chars().count()))
        })
        .collect();
    lengths.sort_by(|a, b| b.1.cmp(&a.1));
    lengths
}

/// Print every reply, then the length ranking
pub fn report(out: &mut impl Write, runs: &[StrategyRun]) -> std::io::Result<()> {
    for run in runs {
        writeln!(out, "=== {} ===", run.name)?;
        match &run.result {
            Ok(completion) => writeln!(out, "{}", completion.text)?,
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
        writeln!(out)?;
    }

    let ranking = ranking(runs);
    writeln!(out, "Response lengths:")?;
    for (name, chars) in &ranking {
        writeln!(out, "  {:<20} {} characters", name, chars)?;
    }
    if let Some((name, _)) = ranking.first() {
        writeln!(out, "\nMost detailed approach: {}", name)?;
    }

    Ok(())
}
