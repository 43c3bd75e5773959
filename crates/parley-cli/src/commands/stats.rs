//! /stats command - show token usage and budget

use super::CommandResult;
use parley_agent::Agent;
use parley_ai::{ProviderKind, Role, Usage, pricing};

const BAR_WIDTH: u64 = 20;

pub struct StatsCommand;

impl StatsCommand {
    pub fn execute(agent: &Agent, kind: ProviderKind) -> CommandResult {
        let stats = agent.stats();
        let model = agent.config().options.model_or_default(kind);
        let threshold = agent.config().compression.warn_threshold;

        let mut output = String::from("Session Stats\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Session:    {}\n", agent.session()));
        output.push_str(&format!("Model:      {} ({})\n", model, kind.name()));
        output.push('\n');

        let user_msgs = agent
            .messages()
            .iter()
            .filter(|m| m.role == Role::User)
            .count();
        output.push_str(&format!("Messages:   {} stored\n", agent.message_count()));
        output.push_str(&format!(
            "            {} user, {} assistant\n",
            user_msgs,
            agent.message_count() - user_msgs
        ));
        output.push_str(&format!(
            "Summary:    {}\n",
            if agent.summary().is_some() { "yes" } else { "no" }
        ));
        output.push('\n');

        output.push_str("Token Usage:\n");
        output.push_str(&format!(
            "  Last turn:   {:>8}\n",
            format_number(stats.turn_total())
        ));
        output.push_str(&format!(
            "  Input:       {:>8}\n",
            format_number(stats.total_input)
        ));
        output.push_str(&format!(
            "  Output:      {:>8}\n",
            format_number(stats.total_output)
        ));
        output.push_str(&format!(
            "  Total:       {:>8}\n",
            format_number(stats.total())
        ));
        if stats.compression_total() > 0 {
            output.push_str(&format!(
                "  Summaries:   {:>8}\n",
                format_number(stats.compression_total())
            ));
        }
        output.push('\n');

        let usage = Usage::new(
            saturating_u32(stats.total_input + stats.compression_input),
            saturating_u32(stats.total_output + stats.compression_output),
        );
        output.push_str(&format!(
            "Estimated cost: {}\n",
            pricing::cost(kind, &model, usage)
        ));

        if threshold > 0 {
            let pct = agent.token_percentage();
            output.push_str(&format!(
                "Budget:         {} {}% of {}\n",
                usage_bar(pct),
                pct,
                format_number(threshold)
            ));
            if agent.is_approaching_limit() {
                output.push_str("Approaching the token limit. Consider clearing history.\n");
            }
        }

        CommandResult::Message(output)
    }
}

fn saturating_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// `[#####...............]`, full at 100% and beyond
fn usage_bar(pct: u64) -> String {
    let filled = (pct.min(100) * BAR_WIDTH / 100) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH as usize - filled)
    )
}

pub(crate) fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
