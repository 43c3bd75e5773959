//! Stub gateway shared by the binary's tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parley_agent::{Agent, AgentConfig, CompressionPolicy, Gateway, MemoryStore};
use parley_ai::{Completion, Message, RequestOptions, Role, Usage};

/// Echoes the last user message at 10/5 tokens and answers summarization
/// prompts with "SUMMARY". Optionally fails one call.
#[derive(Default)]
pub struct EchoGateway {
    pub calls: AtomicUsize,
    pub summaries: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl EchoGateway {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Gateway for EchoGateway {
    async fn send(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> parley_ai::Result<Completion> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(parley_ai::Error::api(503, "upstream unavailable"));
        }

        let model = options.model.clone().unwrap_or_else(|| "stub".into());
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
            .unwrap_or_default();

        if messages.len() == 1 && last_user.starts_with("Summarize the following conversation") {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            return Ok(Completion::new("SUMMARY", Usage::new(20, 4), model));
        }

        Ok(Completion::new(format!("echo:{last_user}"), Usage::new(10, 5), model))
    }
}

/// Agent on an in-memory store, session "chat"
pub fn echo_agent(gateway: Arc<EchoGateway>, max_recent_messages: usize) -> Agent {
    let config = AgentConfig {
        options: RequestOptions::default(),
        compression: CompressionPolicy {
            max_recent_messages,
            ..Default::default()
        },
    };
    Agent::new(config, gateway, Arc::new(MemoryStore::new()), "chat").unwrap()
}
