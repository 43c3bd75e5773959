//! Token bookkeeping for an agent's lifetime

use parley_ai::Usage;
use serde::{Deserialize, Serialize};

/// Token counters for one agent.
///
/// `turn_*` hold the most recent user-visible call and are overwritten every
/// turn. `total_*` only grow. Summarization calls are tracked apart in
/// `compression_*` and never reach the totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub turn_input: u64,
    pub turn_output: u64,
    pub total_input: u64,
    pub total_output: u64,
    pub compression_input: u64,
    pub compression_output: u64,
}

impl TokenLedger {
    /// Record the usage of a user-visible turn
    pub fn record_turn(&mut self, usage: Usage) {
        self.turn_input = u64::from(usage.input);
        self.turn_output = u64::from(usage.output);
        self.total_input = self.total_input.saturating_add(self.turn_input);
        self.total_output = self.total_output.saturating_add(self.turn_output);
    }

    /// Record the usage of a summarization call
    pub fn record_compression(&mut self, usage: Usage) {
        self.compression_input = self.compression_input.saturating_add(u64::from(usage.input));
        self.compression_output = self
            .compression_output
            .saturating_add(u64::from(usage.output));
    }

    pub fn turn_total(&self) -> u64 {
        self.turn_input.saturating_add(self.turn_output)
    }

    pub fn total(&self) -> u64 {
        self.total_input.saturating_add(self.total_output)
    }

    /// Tokens spent on summarization
    pub fn compression_total(&self) -> u64 {
        self.compression_input.saturating_add(self.compression_output)
    }

    /// `floor(100 * total / threshold)`, or 0 with no threshold
    pub fn percentage(&self, threshold: u64) -> u64 {
        if threshold == 0 {
            return 0;
        }
        let pct = u128::from(self.total()) * 100 / u128::from(threshold);
        u64::try_from(pct).unwrap_or(u64::MAX)
    }

    /// `total >= 0.8 * threshold`, compared without rounding. Never true
    /// with no threshold.
    pub fn is_approaching(&self, threshold: u64) -> bool {
        threshold > 0 && u128::from(self.total()) * 5 >= u128::from(threshold) * 4
    }
}

/// Outcome of one `Agent::run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Assistant reply
    pub text: String,
    pub turn_input_tokens: u64,
    pub turn_output_tokens: u64,
    pub turn_total_tokens: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    /// Whether history was compressed before this turn was sent
    pub was_compressed: bool,
}

impl TurnResult {
    pub(crate) fn new(text: String, ledger: &TokenLedger, was_compressed: bool) -> Self {
        Self {
            text,
            turn_input_tokens: ledger.turn_input,
            turn_output_tokens: ledger.turn_output,
            turn_total_tokens: ledger.turn_total(),
            total_input_tokens: ledger.total_input,
            total_output_tokens: ledger.total_output,
            total_tokens: ledger.total(),
            was_compressed,
        }
    }
}
