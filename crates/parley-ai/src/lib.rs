//! parley-ai: single-shot chat clients for hosted LLM providers
//!
//! This crate maps a provider-neutral conversation onto the Claude, DeepSeek
//! and YandexGPT HTTP APIs and reports the generated text together with the
//! provider's token accounting.

pub mod error;
pub mod pricing;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use pricing::{Cost, Currency};
pub use providers::{LlmProvider, ProviderSettings, create_provider};
pub use types::*;
