//! DeepSeek provider (OpenAI-compatible Chat Completions API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LlmProvider, read_json};
use crate::{
    error::{Error, Result},
    types::{Completion, Message, ProviderKind, RequestOptions, Usage},
};

/// DeepSeek API client
pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekProvider {
    /// Create a new DeepSeek provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ProviderKind::DeepSeek.default_base_url().to_string(),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY").map_err(|_| Error::InvalidApiKey)?;
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

    fn build_request(&self, messages: &[Message], options: &RequestOptions) -> ChatRequest {
        let mut converted = Vec::with_capacity(messages.len() + 1);

        // Add system prompt as first message
        if let Some(ref system) = options.system {
            converted.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }

        converted.extend(messages.iter().map(|m| ChatMessage {
            role: m.role.as_str(),
            content: m.text.clone(),
        }));

        ChatRequest {
            model: options.model_or_default(ProviderKind::DeepSeek),
            messages: converted,
            temperature: options.temperature_or_default(),
            max_tokens: options.max_tokens_or_default(),
            stop: options.stop.clone(),
            stream: false,
        }
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion> {
        let request = self.build_request(messages, options);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!("DeepSeek API URL: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ChatResponse = read_json(response).await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                Error::UnexpectedResponse("DeepSeek response contained no message content".into())
            })?;

        let usage = body
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(Completion::new(text, usage, body.model.unwrap_or(request.model)))
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<String>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
