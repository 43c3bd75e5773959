//! parley-agent: conversational agent with history, token ledger and compression
//!
//! An [`Agent`] keeps a multi-turn conversation with an LLM reached through a
//! [`Gateway`], persists it through a [`ConversationStore`], counts tokens
//! against a budget, and folds old turns into a running summary once the
//! history grows too long.

pub mod agent;
pub mod compression;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod pool;
pub mod store;

pub use agent::{Agent, AgentConfig};
pub use compression::CompressionPolicy;
pub use conversation::ConversationState;
pub use error::{Error, Result};
pub use gateway::{Gateway, ProviderGateway, RetryConfig};
pub use ledger::{TokenLedger, TurnResult};
pub use pool::{SessionPool, SharedAgent};
pub use store::{ConversationStore, FileStore, MemoryStore, SessionInfo};
