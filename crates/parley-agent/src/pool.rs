//! One agent per session id, shared between concurrent callers

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    agent::{Agent, AgentConfig},
    error::Result,
    gateway::Gateway,
    store::ConversationStore,
};

/// Shared handle to a session's agent. Holding the lock serializes turns.
pub type SharedAgent = Arc<tokio::sync::Mutex<Agent>>;

/// Hands out one agent per session.
///
/// Turns on the same session queue on that agent's lock; different sessions
/// run independently. Agents share the gateway and store.
pub struct SessionPool {
    config: AgentConfig,
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn ConversationStore>,
    agents: Mutex<HashMap<String, SharedAgent>>,
}

impl SessionPool {
    pub fn new(
        config: AgentConfig,
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            config,
            gateway,
            store,
            agents: Mutex::new(HashMap::new()),
        }
    }

    /// The agent for `session`, loading it from the store on first use
    pub fn get(&self, session: &str) -> Result<SharedAgent> {
        let mut agents = self.agents.lock();
        if let Some(agent) = agents.get(session) {
            return Ok(agent.clone());
        }

        let agent = Agent::new(
            self.config.clone(),
            self.gateway.clone(),
            self.store.clone(),
            session,
        )?;
        let agent = Arc::new(tokio::sync::Mutex::new(agent));
        agents.insert(session.to_string(), agent.clone());
        Ok(agent)
    }

    /// Drop the in-memory agent for `session`. Stored state is untouched.
    pub fn remove(&self, session: &str) -> Option<SharedAgent> {
        self.agents.lock().remove(session)
    }

    /// Number of sessions currently held in memory
    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }
}
