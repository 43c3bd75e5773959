//! LLM Provider implementations

pub mod anthropic;
pub mod deepseek;
pub mod yandex;

use std::time::Duration;

use crate::{Completion, Error, Message, ProviderKind, RequestOptions, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which provider this client talks to
    fn kind(&self) -> ProviderKind;

    /// Send the conversation and wait for the complete reply
    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion>;
}

/// Everything needed to construct a provider client
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,
    /// Override for the provider's API root (tests, proxies)
    pub base_url: Option<String>,
    /// Yandex Cloud folder id (YandexGPT only)
    pub folder_id: Option<String>,
    /// Whole-request timeout
    pub timeout: Option<Duration>,
}

/// Build the client for `kind` from settings.
pub fn create_provider(
    kind: ProviderKind,
    settings: &ProviderSettings,
) -> Result<Box<dyn LlmProvider>> {
    let api_key = get_api_key(settings.api_key.as_deref(), kind.api_key_env_var())?;
    let client = build_client(settings.timeout)?;
    let base_url = settings
        .base_url
        .clone()
        .unwrap_or_else(|| kind.default_base_url().to_string());

    let provider: Box<dyn LlmProvider> = match kind {
        ProviderKind::Claude => Box::new(
            anthropic::AnthropicProvider::new(api_key)
                .with_client(client)
                .with_base_url(base_url),
        ),
        ProviderKind::DeepSeek => Box::new(
            deepseek::DeepSeekProvider::new(api_key)
                .with_client(client)
                .with_base_url(base_url),
        ),
        ProviderKind::YandexGpt => {
            let folder_id = match settings.folder_id.clone() {
                Some(id) => id,
                None => std::env::var("YANDEX_FOLDER_ID").map_err(|_| {
                    Error::InvalidConfig("YandexGPT requires a folder id (YANDEX_FOLDER_ID)".into())
                })?,
            };
            Box::new(
                yandex::YandexProvider::new(api_key, folder_id)
                    .with_client(client)
                    .with_base_url(base_url),
            )
        }
    };

    Ok(provider)
}

/// Get an API key from the provided value or the environment
pub fn get_api_key(provided: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = provided.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Error::InvalidApiKey)
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Read a JSON body, turning non-success statuses into typed errors.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(Error::RateLimited { retry_after });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(Error::api(status.as_u16(), error_message(&body)));
    }

    Ok(serde_json::from_str(&body)?)
}

/// Pull a human-readable message out of an error body.
/// Handles `{"error": {"message": ..}}`, `{"error": ".."}` and `{"message": ..}`.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response body)".to_string()
    } else if trimmed.chars().count() > 500 {
        format!("{}...", trimmed.chars().take(500).collect::<String>())
    } else {
        trimmed.to_string()
    }
}
