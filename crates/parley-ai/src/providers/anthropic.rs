//! Anthropic Claude Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LlmProvider, read_json};
use crate::{
    error::{Error, Result},
    types::{Completion, Message, ProviderKind, RequestOptions, Role, Usage},
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Stand-in first turn when a compressed history starts with an assistant reply
const CONTINUE_PLACEHOLDER: &str = "(continuing the conversation)";

/// Anthropic API client
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ProviderKind::Claude.default_base_url().to_string(),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn build_request(&self, messages: &[Message], options: &RequestOptions) -> AnthropicRequest {
        // Claude takes the system prompt out of band, so system-role messages
        // (e.g. a conversation summary) are folded into it.
        let mut system_parts: Vec<&str> = Vec::new();
        if let Some(ref system) = options.system {
            system_parts.push(system);
        }

        let mut converted = Vec::with_capacity(messages.len());
        for message in messages {
            match message.role {
                Role::System => system_parts.push(&message.text),
                Role::User | Role::Assistant => converted.push(AnthropicMessage {
                    role: message.role.as_str(),
                    content: message.text.clone(),
                }),
            }
        }

        // The Messages API expects the first turn to come from the user
        if converted.first().is_some_and(|m| m.role == Role::Assistant.as_str()) {
            converted.insert(
                0,
                AnthropicMessage {
                    role: Role::User.as_str(),
                    content: CONTINUE_PLACEHOLDER.to_string(),
                },
            );
        }

        AnthropicRequest {
            model: options.model_or_default(ProviderKind::Claude),
            max_tokens: options.max_tokens_or_default(),
            temperature: options.temperature_or_default(),
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages: converted,
            stop_sequences: options.stop.clone().map(|s| vec![s]),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion> {
        let request = self.build_request(messages, options);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!("Anthropic API URL: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let body: AnthropicResponse = read_json(response).await?;
        let text = body
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::UnexpectedResponse(
                "Claude response contained no text content".to_string(),
            ));
        }

        let usage = Usage::new(body.usage.input_tokens, body.usage.output_tokens);
        Ok(Completion::new(text, usage, body.model.unwrap_or(request.model)))
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u32,
    output_tokens: u32,
}
