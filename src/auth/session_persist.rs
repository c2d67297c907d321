//! Sessions mirrored to a durable store.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::auth::durable::{DurableSessionStore, SessionRecord};
use crate::auth::session::SessionPolicy;
use crate::auth::session_store::{SessionEntry, SessionStore};
use crate::types::{SessionId, UserId};

/// Wraps a policy (normally [`ExpiringSessions`](crate::auth::ExpiringSessions))
/// and mirrors every session into a durable store.
///
/// A session resolves only if the wrapped policy accepts it and a durable
/// record exists. The durable store decides whether a session exists; the
/// wrapped policy decides whether it has expired.
pub struct PersistedSessions<P, D> {
    inner: P,
    store: Arc<SessionStore>,
    durable: Arc<D>,
}

impl<P: SessionPolicy, D: DurableSessionStore> PersistedSessions<P, D> {
    pub fn new(inner: P, store: Arc<SessionStore>, durable: Arc<D>) -> Self {
        Self {
            inner,
            store,
            durable,
        }
    }

    pub fn durable(&self) -> &Arc<D> {
        &self.durable
    }

    /// Load every durable record into the in-memory store. Returns how many
    /// sessions were restored.
    pub fn restore(&self) -> Result<usize> {
        let records = self.durable.all()?;
        let count = records.len();
        for record in records {
            self.store.insert(
                record.session_id,
                SessionEntry {
                    user_id: record.user_id,
                    created_at: record.created_at,
                },
            );
        }
        info!("Restored {} persisted sessions", count);
        Ok(count)
    }

    fn find_record(&self, session_id: &str) -> Option<SessionRecord> {
        match self.durable.find_by(session_id) {
            Ok(record) => record,
            Err(e) => {
                warn!("Durable session lookup failed: {}", e);
                None
            }
        }
    }
}

impl<P: SessionPolicy, D: DurableSessionStore> SessionPolicy for PersistedSessions<P, D> {
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        let session_id = self.inner.create_session(user_id)?;
        let entry = self.store.get(session_id.as_str())?;
        let record = SessionRecord {
            session_id: session_id.clone(),
            user_id: entry.user_id,
            created_at: entry.created_at,
        };

        if let Err(e) = self.durable.save(record) {
            warn!("Failed to persist session, discarding it: {}", e);
            self.inner.destroy_session(session_id.as_str());
            return None;
        }
        Some(session_id)
    }

    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        let session_id = session_id.filter(|id| !id.is_empty())?;
        self.inner.user_id_for_session(Some(session_id))?;
        match self.find_record(session_id) {
            Some(record) => Some(record.user_id),
            None => {
                debug!("Session has no durable record");
                None
            }
        }
    }

    fn destroy_session(&self, session_id: &str) -> bool {
        if !self.inner.destroy_session(session_id) {
            return false;
        }
        let Some(record) = self.find_record(session_id) else {
            return false;
        };
        match self.durable.remove(&record) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to remove durable session: {}", e);
                false
            }
        }
    }
}

impl<P, D> std::fmt::Debug for PersistedSessions<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSessions")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
