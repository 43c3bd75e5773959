//! Core types for LLM interactions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Sampling temperature used when a request leaves it unset
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Output token cap used when a request leaves it unset
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Known LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    DeepSeek,
    YandexGpt,
}

impl ProviderKind {
    /// All providers, in display order
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Claude,
        ProviderKind::DeepSeek,
        ProviderKind::YandexGpt,
    ];

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "Claude",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::YandexGpt => "YandexGPT",
        }
    }

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::YandexGpt => "yandexgpt",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::YandexGpt => "YANDEX_API_KEY",
        }
    }

    /// Model used when the request does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude-haiku-4-5-20251001",
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::YandexGpt => "yandexgpt-lite/latest",
        }
    }

    /// Public API root for this provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "https://api.anthropic.com",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
            ProviderKind::YandexGpt => "https://llm.api.cloud.yandex.net",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "yandexgpt" | "yandex" => Ok(ProviderKind::YandexGpt),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}

/// Token usage reported by the provider for one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input: u32,
    pub output: u32,
}

impl Usage {
    pub fn new(input: u32, output: u32) -> Self {
        Self { input, output }
    }

    /// Input plus output tokens
    pub fn total(&self) -> u32 {
        self.input.saturating_add(self.output)
    }
}

/// Result of a single successful request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Provider-reported token counts
    pub usage: Usage,
    /// Model that served the request
    pub model: String,
}

impl Completion {
    pub fn new(text: impl Into<String>, usage: Usage, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage,
            model: model.into(),
        }
    }
}

/// Per-request options; unset fields fall back to provider defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Temperature (0.0 - 1.0 for most providers)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Model identifier, provider-specific
    pub model: Option<String>,
    /// System prompt
    pub system: Option<String>,
    /// Stop sequence
    pub stop: Option<String>,
}

impl RequestOptions {
    /// Temperature to send, falling back to [`DEFAULT_TEMPERATURE`]
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Max tokens to send, falling back to [`DEFAULT_MAX_TOKENS`]
    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Model to send, falling back to the provider default
    pub fn model_or_default(&self, kind: ProviderKind) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_string())
    }
}
