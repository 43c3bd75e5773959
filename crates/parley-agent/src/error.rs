//! Error types for parley-agent

use thiserror::Error;

/// Result type alias using parley-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// The gateway call for the user's turn failed
    #[error(transparent)]
    Gateway(#[from] parley_ai::Error),

    /// The summarization call made while compressing history failed
    #[error("Compression failed: {0}")]
    Compression(#[source] parley_ai::Error),

    /// Reading or writing persisted conversation state failed
    #[error("Store error: {0}")]
    Store(#[from] std::io::Error),

    /// Conversation state could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error came from an upstream LLM call
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Gateway(_) | Error::Compression(_))
    }

    /// The underlying provider error, if any
    pub fn provider_error(&self) -> Option<&parley_ai::Error> {
        match self {
            Error::Gateway(e) | Error::Compression(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let gateway = Error::from(parley_ai::Error::InvalidApiKey);
        let compression = Error::Compression(parley_ai::Error::api(500, "boom"));
        let store = Error::from(std::io::Error::other("disk full"));

        assert!(gateway.is_transport());
        assert!(compression.is_transport());
        assert!(!store.is_transport());
        assert!(store.provider_error().is_none());
    }

    #[test]
    fn test_display() {
        let err = Error::Compression(parley_ai::Error::api(503, "overloaded"));
        assert_eq!(err.to_string(), "Compression failed: API error (503): overloaded");

        let err = Error::from(parley_ai::Error::InvalidApiKey);
        assert_eq!(err.to_string(), "Invalid or missing API key");
    }
}
