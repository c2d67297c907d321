//! Session lifetime enforcement layered over another session policy.

use std::sync::Arc;

use chrono::TimeDelta;
use tracing::debug;

use crate::auth::session::SessionPolicy;
use crate::auth::session_store::SessionStore;
use crate::types::{SessionId, UserId};

/// Wraps a policy so sessions stop resolving `session_duration` seconds after
/// creation. A duration of zero or less disables expiry.
///
/// Expiry is checked lazily on lookup; expired entries stay in the store until
/// destroyed. Creation times come from [`SessionStore::create`], which stamps
/// every entry it issues. A lifetime too large to represent never expires.
#[derive(Debug)]
pub struct ExpiringSessions<P> {
    inner: P,
    store: Arc<SessionStore>,
    session_duration: i64,
}

impl<P: SessionPolicy> ExpiringSessions<P> {
    pub fn new(inner: P, store: Arc<SessionStore>, session_duration: i64) -> Self {
        Self {
            inner,
            store,
            session_duration,
        }
    }

    pub fn session_duration(&self) -> i64 {
        self.session_duration
    }

    pub fn expires(&self) -> bool {
        self.session_duration > 0
    }
}

impl<P: SessionPolicy> SessionPolicy for ExpiringSessions<P> {
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        self.inner.create_session(user_id)
    }

    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        let session_id = session_id.filter(|id| !id.is_empty())?;
        let user_id = self.inner.user_id_for_session(Some(session_id))?;
        if !self.expires() {
            return Some(user_id);
        }

        let Some(created_at) = self.store.get(session_id).and_then(|e| e.created_at) else {
            debug!("Session has no creation time; treating as expired");
            return None;
        };
        let Some(deadline) = TimeDelta::try_seconds(self.session_duration)
            .and_then(|lifetime| created_at.checked_add_signed(lifetime))
        else {
            return Some(user_id);
        };
        if deadline < self.store.now() {
            debug!("Session expired at {}", deadline);
            return None;
        }
        Some(user_id)
    }

    fn destroy_session(&self, session_id: &str) -> bool {
        self.inner.destroy_session(session_id)
    }
}
