//! Conversation state: message history and the running summary of compressed turns.

use parley_ai::{Message, Role};
use serde::{Deserialize, Serialize};

/// Prefix of the synthetic system message that carries the summary.
pub const SUMMARY_PREFIX: &str = "Previous conversation summary: ";

/// Persisted state of one conversation.
///
/// `messages` only ever holds real user/assistant turns. The summary is
/// turned into a context message at send time and never stored as one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Turns in the order they were exchanged
    pub messages: Vec<Message>,
    /// Summary of turns dropped by compression
    pub summary: Option<String>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>, summary: Option<String>) -> Self {
        Self { messages, summary }
    }

    /// True when there is nothing worth persisting
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.summary.is_none()
    }

    /// Messages to send upstream: the summary (if any) as a system message,
    /// followed by every stored turn.
    pub fn context(&self) -> Vec<Message> {
        let mut context = Vec::with_capacity(self.messages.len() + 1);
        if let Some(ref summary) = self.summary {
            context.push(Message::system(format!("{SUMMARY_PREFIX}{summary}")));
        }
        context.extend(self.messages.iter().cloned());
        context
    }

    /// True when the last message is a user turn that never got a reply
    pub fn has_pending_user_turn(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == Role::User)
    }
}

/// On-disk shape of a conversation.
///
/// Older history files are a bare JSON array of messages; both shapes load.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredConversation {
    Current {
        messages: Vec<Message>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        /// Unix millis of the last save
        #[serde(default)]
        updated_at: i64,
    },
    Legacy(Vec<Message>),
}

impl StoredConversation {
    pub(crate) fn from_state(state: &ConversationState) -> Self {
        StoredConversation::Current {
            messages: state.messages.clone(),
            summary: state.summary.clone(),
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub(crate) fn updated_at(&self) -> Option<i64> {
        match self {
            StoredConversation::Current { updated_at, .. } if *updated_at > 0 => Some(*updated_at),
            _ => None,
        }
    }

    pub(crate) fn into_state(self) -> ConversationState {
        match self {
            StoredConversation::Current {
                messages, summary, ..
            } => ConversationState::new(messages, summary),
            StoredConversation::Legacy(messages) => ConversationState::new(messages, None),
        }
    }
}
