//! History compression for long conversations
//!
//! Once the stored history grows past twice the number of recent messages the
//! agent keeps verbatim, the older part is summarized by the LLM and dropped.
//! The summary travels with every later request as a system message.

use parley_ai::{Message, RequestOptions, Usage};
use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

/// When and how much history to compress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionPolicy {
    /// Whether compression runs at all
    pub enabled: bool,
    /// Messages kept verbatim after a compression
    pub max_recent_messages: usize,
    /// Token budget used for the approaching-limit warning
    pub warn_threshold: u64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_recent_messages: 6,
            warn_threshold: 4000,
        }
    }
}

impl CompressionPolicy {
    /// Policy that never compresses but still warns at `warn_threshold`
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Whether a history of `message_count` messages should be compressed
    pub fn should_compress(&self, message_count: usize) -> bool {
        self.enabled && message_count > self.max_recent_messages.saturating_mul(2)
    }
}

/// Outcome of one summarization call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// New summary; replaces any previous one
    pub summary: String,
    /// Number of leading messages the summary covers
    pub compressed_count: usize,
    /// Tokens spent on the summarization call
    pub usage: Usage,
}

const SUMMARIZATION_PROMPT: &str = "\
Summarize the following conversation concisely in 2-3 sentences. \
Keep the key facts, names and numbers the user may refer back to.

{conversation}";

/// Render messages as a `[role] text` transcript, one line per message.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The single-turn prompt sent to summarize `messages`
pub fn summarization_prompt(messages: &[Message]) -> String {
    SUMMARIZATION_PROMPT.replace("{conversation}", &transcript(messages))
}

/// Summarize everything except the last `keep` messages.
///
/// Returns `Ok(None)` when there is nothing older than `keep`. The call is a
/// plain single-message request; only `options.model` is carried over so the
/// summary is not shaped by the chat's system prompt or stop sequence.
pub async fn summarize(
    messages: &[Message],
    keep: usize,
    options: &RequestOptions,
    gateway: &dyn Gateway,
) -> parley_ai::Result<Option<Compressed>> {
    let compressed_count = messages.len().saturating_sub(keep);
    if compressed_count == 0 {
        return Ok(None);
    }

    let prompt = summarization_prompt(&messages[..compressed_count]);
    let summary_options = RequestOptions {
        model: options.model.clone(),
        ..Default::default()
    };

    tracing::debug!(
        "Summarizing {} of {} messages (keeping {})",
        compressed_count,
        messages.len(),
        keep
    );

    let completion = gateway
        .send(&[Message::user(prompt)], &summary_options)
        .await?;
    if completion.text.trim().is_empty() {
        return Err(parley_ai::Error::UnexpectedResponse("empty summary".into()));
    }

    Ok(Some(Compressed {
        summary: completion.text,
        compressed_count,
        usage: completion.usage,
    }))
}
