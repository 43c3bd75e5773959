//! Agent state management and execution

use std::sync::Arc;

use parley_ai::{Message, RequestOptions};

use crate::{
    compression::{self, CompressionPolicy},
    conversation::ConversationState,
    error::{Error, Result},
    gateway::Gateway,
    ledger::{TokenLedger, TurnResult},
    store::ConversationStore,
};

/// Agent configuration
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Options sent with every user turn
    pub options: RequestOptions,
    /// History compression and token budget
    pub compression: CompressionPolicy,
}

/// A conversation with one LLM: history, running summary and token budget.
///
/// Turns on one agent are strictly sequential (`run` takes `&mut self`).
pub struct Agent {
    config: AgentConfig,
    session: String,
    state: ConversationState,
    ledger: TokenLedger,
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn ConversationStore>,
}

impl Agent {
    /// Create an agent for `session`, loading whatever the store holds for it
    pub fn new(
        config: AgentConfig,
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn ConversationStore>,
        session: impl Into<String>,
    ) -> Result<Self> {
        let session = session.into();
        let state = store.load(&session)?;

        tracing::debug!(
            "Loaded session {} ({} messages, summary: {})",
            session,
            state.messages.len(),
            state.summary.is_some()
        );

        Ok(Self {
            config,
            session,
            state,
            ledger: TokenLedger::default(),
            gateway,
            store,
        })
    }

    /// Session id this agent persists under
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Get the agent config
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replace the options sent with later turns
    pub fn set_options(&mut self, options: RequestOptions) {
        self.config.options = options;
    }

    /// Replace the compression policy
    pub fn set_compression_policy(&mut self, policy: CompressionPolicy) {
        self.config.compression = policy;
    }

    /// Run one user turn.
    ///
    /// Compresses old history first when the policy says so, sends the
    /// context, records the reply and usage, and persists the conversation.
    /// On failure nothing is persisted; the user message stays in memory and
    /// a later `run` with the same text re-sends it instead of appending it
    /// twice.
    pub async fn run(&mut self, user_message: &str) -> Result<TurnResult> {
        if self.is_unanswered(user_message) {
            tracing::debug!("Re-sending unanswered message in session {}", self.session);
        } else {
            self.state.messages.push(Message::user(user_message));
        }

        // Judge the history as it will be stored, reply included. A user
        // message left unanswered by an earlier failure makes the length odd.
        let was_compressed = if self
            .config
            .compression
            .should_compress(self.state.messages.len() + 1)
        {
            self.compress_history().await?
        } else {
            false
        };

        let context = self.state.context();
        let completion = self.gateway.send(&context, &self.config.options).await?;
        if completion.text.is_empty() {
            return Err(Error::Gateway(parley_ai::Error::UnexpectedResponse(
                "empty reply".into(),
            )));
        }

        self.state
            .messages
            .push(Message::assistant(completion.text.clone()));
        self.ledger.record_turn(completion.usage);
        self.store.save(&self.session, &self.state)?;

        Ok(TurnResult::new(completion.text, &self.ledger, was_compressed))
    }

    /// Summarize older history now, regardless of the policy's trigger.
    ///
    /// A no-op returning `false` when no more than `max_recent_messages`
    /// messages are stored.
    pub async fn compress(&mut self) -> Result<bool> {
        let compressed = self.compress_history().await?;
        if compressed {
            self.store.save(&self.session, &self.state)?;
        }
        Ok(compressed)
    }

    async fn compress_history(&mut self) -> Result<bool> {
        let keep = self.config.compression.max_recent_messages.max(1);
        let outcome = compression::summarize(
            &self.state.messages,
            keep,
            &self.config.options,
            self.gateway.as_ref(),
        )
        .await
        .map_err(Error::Compression)?;

        let Some(compressed) = outcome else {
            return Ok(false);
        };

        self.state.messages.drain(..compressed.compressed_count);
        self.state.summary = Some(compressed.summary);
        self.ledger.record_compression(compressed.usage);

        tracing::info!(
            "Compressed {} messages of session {} into a summary ({} kept)",
            compressed.compressed_count,
            self.session,
            self.state.messages.len()
        );

        Ok(true)
    }

    fn is_unanswered(&self, user_message: &str) -> bool {
        self.state.has_pending_user_turn()
            && self
                .state
                .messages
                .last()
                .is_some_and(|m| m.text == user_message)
    }

    /// Forget the conversation: messages, summary, token counts and the
    /// stored copy
    pub fn clear_history(&mut self) -> Result<()> {
        self.state = ConversationState::default();
        self.ledger = TokenLedger::default();
        self.store.delete(&self.session)
    }

    /// Number of stored messages (the summary is not counted)
    pub fn message_count(&self) -> usize {
        self.state.messages.len()
    }

    /// Get all stored messages
    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    /// Current summary of compressed history
    pub fn summary(&self) -> Option<&str> {
        self.state.summary.as_deref()
    }

    /// True once total usage reaches 80% of the warn threshold
    pub fn is_approaching_limit(&self) -> bool {
        self.ledger
            .is_approaching(self.config.compression.warn_threshold)
    }

    /// Total usage as a whole percentage of the warn threshold
    pub fn token_percentage(&self) -> u64 {
        self.ledger.percentage(self.config.compression.warn_threshold)
    }

    /// Token counters
    pub fn stats(&self) -> TokenLedger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use parley_ai::{Completion, Role, Usage};
    use std::collections::VecDeque;

    /// A mock gateway that returns canned replies and records every request.
    struct MockGateway {
        replies: Mutex<VecDeque<parley_ai::Result<Completion>>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl MockGateway {
        fn new(replies: Vec<parley_ai::Result<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        async fn send(
            &self,
            messages: &[Message],
            _options: &RequestOptions,
        ) -> parley_ai::Result<Completion> {
            self.requests.lock().push(messages.to_vec());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| reply("done", 1, 1))
        }
    }

    fn reply(text: &str, input: u32, output: u32) -> parley_ai::Result<Completion> {
        Ok(Completion::new(text, Usage::new(input, output), "mock"))
    }

    fn make_test_agent(
        gateway: Arc<MockGateway>,
        store: Arc<MemoryStore>,
        policy: CompressionPolicy,
    ) -> Agent {
        let config = AgentConfig {
            options: RequestOptions::default(),
            compression: policy,
        };
        Agent::new(config, gateway, store, "test").unwrap()
    }

    #[tokio::test]
    async fn test_run_appends_and_persists() {
        let gateway = MockGateway::new(vec![reply("Hello!", 10, 5)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store.clone(), CompressionPolicy::default());

        let result = agent.run("Hi").await.unwrap();

        assert_eq!(result.text, "Hello!");
        assert_eq!(result.turn_total_tokens, 15);
        assert!(!result.was_compressed);
        assert_eq!(agent.messages(), &[Message::user("Hi"), Message::assistant("Hello!")]);
        assert_eq!(store.get("test").unwrap().messages, agent.messages());
        assert_eq!(gateway.requests.lock()[0], vec![Message::user("Hi")]);
    }

    #[tokio::test]
    async fn test_resumes_from_store() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                "test",
                &ConversationState::new(
                    vec![Message::user("old"), Message::assistant("reply")],
                    Some("earlier".into()),
                ),
            )
            .unwrap();

        let gateway = MockGateway::new(vec![]);
        let mut agent = make_test_agent(gateway.clone(), store, CompressionPolicy::default());
        assert_eq!(agent.message_count(), 2);
        assert_eq!(agent.summary(), Some("earlier"));

        agent.run("new").await.unwrap();
        let sent = &gateway.requests.lock()[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].text, "Previous conversation summary: earlier");
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let gateway = MockGateway::new(vec![reply("", 3, 0)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store.clone(), CompressionPolicy::default());

        let err = agent.run("Hi").await.unwrap_err();
        assert!(err.is_transport());
        assert!(!store.contains("test"));
        assert_eq!(agent.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_compression_triggers_past_twice_keep() {
        let policy = CompressionPolicy {
            max_recent_messages: 2,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![
            reply("a1", 10, 5),
            reply("a2", 10, 5),
            // Turn 3: 5 messages > 4, summarize first then answer
            reply("SUMMARY", 50, 9),
            reply("a3", 10, 5),
        ]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store.clone(), policy);

        assert!(!agent.run("q1").await.unwrap().was_compressed);
        assert!(!agent.run("q2").await.unwrap().was_compressed);
        let result = agent.run("q3").await.unwrap();

        assert!(result.was_compressed);
        assert_eq!(agent.summary(), Some("SUMMARY"));
        assert_eq!(agent.messages(), &[
            Message::assistant("a2"),
            Message::user("q3"),
            Message::assistant("a3"),
        ]);

        // Summarization is kept out of the totals
        assert_eq!(result.total_input_tokens, 30);
        assert_eq!(agent.stats().compression_input, 50);
        assert_eq!(agent.stats().compression_output, 9);

        let requests = gateway.requests.lock();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[2].len(), 1);
        assert!(requests[2][0].text.contains("[user] q1"));
        assert!(requests[2][0].text.contains("[user] q2"));
        assert_eq!(requests[3][0].text, "Previous conversation summary: SUMMARY");
        assert_eq!(&requests[3][1..], &[Message::assistant("a2"), Message::user("q3")]);

        let stored = store.get("test").unwrap();
        assert_eq!(stored.summary.as_deref(), Some("SUMMARY"));
        assert_eq!(stored.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_compression_failure_fails_turn() {
        let policy = CompressionPolicy {
            max_recent_messages: 1,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![
            reply("a1", 10, 5),
            Err(parley_ai::Error::api(500, "summarizer down")),
        ]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store.clone(), policy);

        agent.run("q1").await.unwrap();
        let err = agent.run("q2").await.unwrap_err();

        assert!(matches!(err, Error::Compression(_)));
        assert_eq!(agent.message_count(), 3);
        assert!(agent.summary().is_none());
        assert_eq!(store.get("test").unwrap().messages.len(), 2);
        assert_eq!(gateway.requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_summary_fails_turn() {
        let policy = CompressionPolicy {
            max_recent_messages: 1,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![reply("a1", 10, 5), reply("  ", 20, 0)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store.clone(), policy);

        agent.run("q1").await.unwrap();
        let err = agent.run("q2").await.unwrap_err();

        assert!(matches!(
            err,
            Error::Compression(parley_ai::Error::UnexpectedResponse(_))
        ));
        assert!(agent.summary().is_none());
        assert_eq!(agent.message_count(), 3);
        assert_eq!(agent.stats().compression_total(), 0);
        assert!(store.get("test").unwrap().summary.is_none());
        assert_eq!(gateway.requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_orphaned_message_does_not_overflow_history() {
        let policy = CompressionPolicy {
            max_recent_messages: 2,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![
            reply("a1", 1, 1),
            Err(parley_ai::Error::api(503, "busy")),
            reply("SUMMARY", 5, 2),
            reply("a3", 1, 1),
        ]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store.clone(), policy);

        agent.run("q1").await.unwrap();
        assert!(agent.run("q2").await.is_err());

        // q1 a1 q2 q3 is 4 messages; with the reply it would be 5 > 4
        let result = agent.run("q3").await.unwrap();
        assert!(result.was_compressed);
        assert_eq!(agent.messages(), &[
            Message::user("q2"),
            Message::user("q3"),
            Message::assistant("a3"),
        ]);
        assert_eq!(store.get("test").unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_duplicate_user_message() {
        let gateway = MockGateway::new(vec![
            Err(parley_ai::Error::api(503, "busy")),
            reply("pong", 4, 1),
        ]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store, CompressionPolicy::default());

        assert!(agent.run("ping").await.is_err());
        assert_eq!(agent.messages(), &[Message::user("ping")]);

        agent.run("ping").await.unwrap();
        assert_eq!(agent.messages(), &[Message::user("ping"), Message::assistant("pong")]);
        assert_eq!(gateway.requests.lock()[1], vec![Message::user("ping")]);
    }

    #[tokio::test]
    async fn test_different_text_after_failure_is_appended() {
        let gateway = MockGateway::new(vec![Err(parley_ai::Error::InvalidApiKey)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store, CompressionPolicy::default());

        assert!(agent.run("first").await.is_err());
        agent.run("second").await.unwrap();
        assert_eq!(agent.message_count(), 3);
        assert_eq!(agent.messages()[1], Message::user("second"));
    }

    #[tokio::test]
    async fn test_manual_compress_guard() {
        let policy = CompressionPolicy {
            max_recent_messages: 2,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![reply("a1", 1, 1)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway.clone(), store, policy);

        agent.run("q1").await.unwrap();
        assert!(!agent.compress().await.unwrap());
        assert_eq!(agent.message_count(), 2);
        assert!(agent.summary().is_none());
        assert_eq!(gateway.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_compress_persists() {
        let policy = CompressionPolicy {
            enabled: false,
            max_recent_messages: 1,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![reply("a1", 1, 1), reply("S", 2, 2)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store.clone(), policy);

        agent.run("q1").await.unwrap();
        assert!(agent.compress().await.unwrap());
        assert_eq!(agent.messages(), &[Message::assistant("a1")]);
        assert_eq!(store.get("test").unwrap().summary.as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn test_clear_history_resets_everything() {
        let gateway = MockGateway::new(vec![reply("a1", 100, 50)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store.clone(), CompressionPolicy::default());

        agent.run("q1").await.unwrap();
        agent.clear_history().unwrap();
        agent.clear_history().unwrap();

        assert_eq!(agent.message_count(), 0);
        assert!(agent.summary().is_none());
        assert_eq!(agent.stats(), TokenLedger::default());
        assert!(!store.contains("test"));
    }

    #[tokio::test]
    async fn test_limit_tracking() {
        let policy = CompressionPolicy {
            warn_threshold: 100,
            ..Default::default()
        };
        let gateway = MockGateway::new(vec![reply("a", 60, 19), reply("b", 1, 0)]);
        let store = Arc::new(MemoryStore::new());
        let mut agent = make_test_agent(gateway, store, policy);

        agent.run("q1").await.unwrap();
        assert_eq!(agent.token_percentage(), 79);
        assert!(!agent.is_approaching_limit());

        agent.run("q2").await.unwrap();
        assert_eq!(agent.token_percentage(), 80);
        assert!(agent.is_approaching_limit());
    }
}
