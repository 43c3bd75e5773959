//! Gateway abstraction between the agent and LLM providers

use std::time::Duration;

use async_trait::async_trait;
use parley_ai::{Completion, LlmProvider, Message, ProviderKind, RequestOptions, Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Single-shot, stateless LLM call used by the agent.
///
/// Any failure (transport, auth, malformed body, missing configuration)
/// comes back as a `parley_ai::Error`.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion>;
}

/// Gateway backed by a real provider client, retrying transient failures
pub struct ProviderGateway {
    provider: Box<dyn LlmProvider>,
    retry_config: RetryConfig,
}

impl ProviderGateway {
    /// Create a new provider gateway
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Which provider this gateway talks to
    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }
}

#[async_trait]
impl Gateway for ProviderGateway {
    async fn send(&self, messages: &[Message], options: &RequestOptions) -> Result<Completion> {
        let mut attempt = 0u32;

        loop {
            match self.provider.send(messages, options).await {
                Ok(completion) => return Ok(completion),
                Err(e) => {
                    if attempt < self.retry_config.max_retries && e.is_retryable() {
                        let delay = match &e {
                            parley_ai::Error::RateLimited {
                                retry_after: Some(secs),
                            } => Duration::from_secs(*secs).min(self.retry_config.max_delay),
                            _ => self.retry_config.delay_for_attempt(attempt),
                        };
                        tracing::warn!(
                            "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            self.provider.kind().name(),
                            attempt + 1,
                            self.retry_config.max_retries + 1,
                            e,
                            delay
                        );
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    // Non-retryable or max retries exceeded
                    return Err(e);
                }
            }
        }
    }
}
