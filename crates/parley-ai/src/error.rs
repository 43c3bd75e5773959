//! Error types for parley-ai

use thiserror::Error;

/// Result type alias using parley-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to an LLM provider
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Response parsed but did not carry the expected data
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Provider not supported
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder() && !e.is_decode(),
            Error::RateLimited { .. } => true,
            Error::Api { status, message } => {
                let msg = message.to_lowercase();
                *status == 429
                    || *status >= 500
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_rate_limited() {
        assert!(Error::RateLimited { retry_after: Some(5) }.is_retryable());
        assert!(Error::RateLimited { retry_after: None }.is_retryable());
    }

    #[test]
    fn test_retryable_server_errors() {
        assert!(Error::api(500, "internal error").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(Error::api(429, "slow down").is_retryable());
    }

    #[test]
    fn test_retryable_overloaded_message() {
        let e = Error::api(400, "The model is overloaded right now");
        assert!(e.is_retryable());
    }

    #[test]
    fn test_not_retryable_client_errors() {
        assert!(!Error::api(401, "Invalid API key").is_retryable());
        assert!(!Error::api(400, "max_tokens must be positive").is_retryable());
    }

    #[test]
    fn test_not_retryable_local_errors() {
        assert!(!Error::InvalidApiKey.is_retryable());
        assert!(!Error::InvalidConfig("no folder id".into()).is_retryable());
        assert!(!Error::UnexpectedResponse("no text".into()).is_retryable());
        assert!(!Error::UnsupportedProvider("gemini".into()).is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        let e = Error::api(404, "model not found");
        assert_eq!(e.to_string(), "API error (404): model not found");
    }
}
