//! YandexGPT Foundation Models completion API provider

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::{LlmProvider, read_json};
use crate::{
    error::{Error, Result},
    types::{Completion, Message, ProviderKind, RequestOptions, Usage},
};

/// YandexGPT API client
pub struct YandexProvider {
    client: reqwest::Client,
    api_key: String,
    folder_id: String,
    base_url: String,
}

impl YandexProvider {
    /// Create a new YandexGPT provider for a Yandex Cloud folder
    pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            base_url: ProviderKind::YandexGpt.default_base_url().to_string(),
        }
    }

    /// Create from `YANDEX_API_KEY` and `YANDEX_FOLDER_ID`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("YANDEX_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        let folder_id = std::env::var("YANDEX_FOLDER_ID")
            .map_err(|_| Error::InvalidConfig("YANDEX_FOLDER_ID is not set".into()))?;
        Ok(Self::new(api_key, folder_id))
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

    /// Full model URI; bare names are resolved inside the configured folder.
    fn model_uri(&self, model: &str) -> String {
        if model.starts_with("gpt://") {
            model.to_string()
        } else {
            format!("gpt://{}/{}", self.folder_id, model)
        }
    }

    fn build_request(&self, messages: &[Message], options: &RequestOptions) -> Result<CompletionRequest> {
        if self.folder_id.trim().is_empty() {
            return Err(Error::InvalidConfig("YandexGPT folder id is empty".into()));
        }

        if options.stop.is_some() {
            tracing::debug!("YandexGPT has no stop sequence support, ignoring");
        }

        let mut converted = Vec::with_capacity(messages.len() + 1);
        if let Some(ref system) = options.system {
            converted.push(YandexMessage {
                role: "system",
                text: system.clone(),
            });
        }
        converted.extend(messages.iter().map(|m| YandexMessage {
            role: m.role.as_str(),
            text: m.text.clone(),
        }));

        Ok(CompletionRequest {
            model_uri: self.model_uri(&options.model_or_default(ProviderKind::YandexGpt)),
            completion_options: CompletionOptions {
                stream: false,
                temperature: options.temperature_or_default(),
                max_tokens: options.max_tokens_or_default(),
            },
            messages: converted,
        })
    }
}

#[async_trait]
impl LlmProvider for YandexProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::YandexGpt
    }

    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion> {
        let request = self.build_request(messages, options)?;
        let url = format!("{}/foundationModels/v1/completion", self.base_url);

        tracing::debug!("YandexGPT API URL: {} ({})", url, request.model_uri);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .header("x-folder-id", &self.folder_id)
            .json(&request)
            .send()
            .await?;

        let body: CompletionResponse = read_json(response).await?;
        let text = body
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|alt| alt.message.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                Error::UnexpectedResponse("YandexGPT response contained no alternatives".into())
            })?;

        let usage = Usage::new(
            body.result.usage.input_text_tokens,
            body.result.usage.completion_tokens,
        );
        let model = options.model_or_default(ProviderKind::YandexGpt);

        Ok(Completion::new(text, usage, model))
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<YandexMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct YandexMessage {
    role: &'static str,
    text: String,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    #[serde(default)]
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageInfo {
    #[serde(default, deserialize_with = "token_count")]
    input_text_tokens: u32,
    #[serde(default, deserialize_with = "token_count")]
    completion_tokens: u32,
}

/// The API encodes int64 counters as JSON strings; accept either form.
fn token_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
