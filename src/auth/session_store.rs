//! In-memory session table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::types::{SessionId, UserId};

/// What the memory store keeps per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub user_id: UserId,
    /// Missing for entries restored from records that never carried a timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Process-wide session table, injected into whichever session layers need it.
///
/// All access goes through one lock, so concurrent create/destroy calls never
/// lose updates.
pub struct SessionStore {
    entries: RwLock<HashMap<SessionId, SessionEntry>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a fresh session ID for `user_id`, stamped with the current time.
    pub fn create(&self, user_id: UserId) -> SessionId {
        let entry = SessionEntry {
            user_id,
            created_at: Some(self.now()),
        };
        let mut entries = self.entries.write();
        loop {
            let session_id = SessionId::generate();
            if !entries.contains_key(&session_id) {
                entries.insert(session_id.clone(), entry);
                return session_id;
            }
        }
    }

    /// Put an entry back under a known ID, replacing any existing one.
    pub fn insert(&self, session_id: SessionId, entry: SessionEntry) {
        self.entries.write().insert(session_id, entry);
    }

    pub fn get(&self, session_id: &str) -> Option<SessionEntry> {
        self.entries.read().get(session_id).cloned()
    }

    /// Remove the entry, returning it if it existed.
    pub fn remove(&self, session_id: &str) -> Option<SessionEntry> {
        self.entries.write().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .finish()
    }
}
