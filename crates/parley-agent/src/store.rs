//! Persistence of conversation state, keyed by session id

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::conversation::{ConversationState, StoredConversation};
use crate::error::Result;

/// Key-value persistence of one conversation per session id.
///
/// `load` of an unknown session yields empty state. `delete` of an unknown
/// session succeeds.
pub trait ConversationStore: Send + Sync {
    fn load(&self, session: &str) -> Result<ConversationState>;
    fn save(&self, session: &str, state: &ConversationState) -> Result<()>;
    fn delete(&self, session: &str) -> Result<()>;
}

/// One pretty-printed JSON file per session in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `session`. Characters outside `[A-Za-z0-9_-]` are
    /// replaced so an id can never escape the directory.
    pub fn path_for(&self, session: &str) -> PathBuf {
        let name: String = session
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = if name.is_empty() { "default".to_string() } else { name };
        self.dir.join(format!("{name}.json"))
    }

    /// List all stored sessions, most recently updated first
    pub fn list(&self) -> Result<Vec<SessionInfo>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut sessions = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(info) = read_session_info(&path) {
                    sessions.push(info);
                }
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        Ok(sessions)
    }
}

fn read_session_info(path: &Path) -> Option<SessionInfo> {
    let id = path.file_stem()?.to_str()?.to_string();
    let content = fs::read_to_string(path).ok()?;
    let stored: StoredConversation = serde_json::from_str(&content).ok()?;
    let updated_at = stored.updated_at();
    let state = stored.into_state();

    Some(SessionInfo {
        id,
        message_count: state.messages.len(),
        has_summary: state.summary.is_some(),
        updated_at,
    })
}

impl ConversationStore for FileStore {
    fn load(&self, session: &str) -> Result<ConversationState> {
        let path = self.path_for(session);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ConversationState::default()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(ConversationState::default());
        }

        match serde_json::from_str::<StoredConversation>(&content) {
            Ok(stored) => Ok(stored.into_state()),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable conversation state in {}: {}",
                    path.display(),
                    e
                );
                Ok(ConversationState::default())
            }
        }
    }

    fn save(&self, session: &str, state: &ConversationState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(session);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&StoredConversation::from_state(state))?;

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Saved {} messages to {}", state.messages.len(), path.display());
        Ok(())
    }

    fn delete(&self, session: &str) -> Result<()> {
        match fs::remove_file(self.path_for(session)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Store that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is stored for `session`
    pub fn contains(&self, session: &str) -> bool {
        self.sessions.lock().contains_key(session)
    }

    /// Copy of the stored state, if any
    pub fn get(&self, session: &str) -> Option<ConversationState> {
        self.sessions.lock().get(session).cloned()
    }
}

impl ConversationStore for MemoryStore {
    fn load(&self, session: &str) -> Result<ConversationState> {
        Ok(self.get(session).unwrap_or_default())
    }

    fn save(&self, session: &str, state: &ConversationState) -> Result<()> {
        self.sessions
            .lock()
            .insert(session.to_string(), state.clone());
        Ok(())
    }

    fn delete(&self, session: &str) -> Result<()> {
        self.sessions.lock().remove(session);
        Ok(())
    }
}

/// Information about a saved session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub message_count: usize,
    pub has_summary: bool,
    /// Unix millis of the last save; absent for legacy files
    pub updated_at: Option<i64>,
}

impl SessionInfo {
    /// Format the updated_at timestamp for display
    pub fn updated_at_display(&self) -> String {
        use chrono::{Local, TimeZone};
        self.updated_at
            .and_then(|ms| Local.timestamp_millis_opt(ms).single())
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
