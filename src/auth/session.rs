//! Session-based authentication.
//!
//! A [`SessionPolicy`] owns the session lifecycle (create, resolve, destroy).
//! Policies stack: [`MemorySessions`] is the base, and the expiring and
//! persisted layers wrap another policy and delegate to it.
//! [`SessionAuthenticator`] plugs any policy into the [`Authenticator`]
//! contract by reading the session cookie.

use std::sync::Arc;

use http::HeaderMap;
use tracing::{debug, warn};

use crate::auth::authenticator::{Authenticator, cookie_value};
use crate::auth::session_store::SessionStore;
use crate::auth::user_store::{User, UserStore};
use crate::types::{SessionId, UserId};

/// Session lifecycle operations.
pub trait SessionPolicy: Send + Sync {
    /// Issue a session for `user_id`. `None` when there is no usable user ID.
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId>;

    /// The user behind a live session.
    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId>;

    /// End a session. `false` if it was not known.
    fn destroy_session(&self, session_id: &str) -> bool;
}

impl<P: SessionPolicy + ?Sized> SessionPolicy for Arc<P> {
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        (**self).create_session(user_id)
    }

    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        (**self).user_id_for_session(session_id)
    }

    fn destroy_session(&self, session_id: &str) -> bool {
        (**self).destroy_session(session_id)
    }
}

impl<P: SessionPolicy + ?Sized> SessionPolicy for Box<P> {
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        (**self).create_session(user_id)
    }

    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        (**self).user_id_for_session(session_id)
    }

    fn destroy_session(&self, session_id: &str) -> bool {
        (**self).destroy_session(session_id)
    }
}

/// Sessions that live only in the in-memory store and never expire.
#[derive(Debug, Clone)]
pub struct MemorySessions {
    store: Arc<SessionStore>,
}

impl MemorySessions {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}

impl SessionPolicy for MemorySessions {
    fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        let user_id = user_id.filter(|id| !id.as_str().is_empty())?;
        let session_id = self.store.create(user_id.clone());
        debug!("Created session for user {}", user_id);
        Some(session_id)
    }

    fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        let session_id = session_id.filter(|id| !id.is_empty())?;
        self.store.get(session_id).map(|entry| entry.user_id)
    }

    fn destroy_session(&self, session_id: &str) -> bool {
        self.store.remove(session_id).is_some()
    }
}

/// Authenticates requests from the session cookie.
#[derive(Clone)]
pub struct SessionAuthenticator {
    policy: Arc<dyn SessionPolicy>,
    users: Arc<dyn UserStore>,
    session_name: String,
}

impl SessionAuthenticator {
    pub fn new(
        policy: Arc<dyn SessionPolicy>,
        users: Arc<dyn UserStore>,
        session_name: impl Into<String>,
    ) -> Self {
        Self {
            policy,
            users,
            session_name: session_name.into(),
        }
    }

    /// Name of the cookie carrying the session ID.
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn policy(&self) -> &Arc<dyn SessionPolicy> {
        &self.policy
    }

    /// Session ID from the request's session cookie.
    pub fn session_cookie(&self, request: Option<&HeaderMap>) -> Option<String> {
        cookie_value(request, &self.session_name)
    }

    pub fn create_session(&self, user_id: Option<&UserId>) -> Option<SessionId> {
        self.policy.create_session(user_id)
    }

    pub fn user_id_for_session(&self, session_id: Option<&str>) -> Option<UserId> {
        self.policy.user_id_for_session(session_id)
    }

    /// End the session named by the request's cookie.
    pub fn destroy_session(&self, request: Option<&HeaderMap>) -> bool {
        let Some(session_id) = self.session_cookie(request) else {
            return false;
        };
        self.policy.destroy_session(&session_id)
    }
}

impl Authenticator for SessionAuthenticator {
    fn current_user(&self, request: Option<&HeaderMap>) -> Option<User> {
        let session_id = self.session_cookie(request)?;
        let user_id = self.user_id_for_session(Some(&session_id))?;
        match self.users.find_by_id(&user_id) {
            Ok(user) => user,
            Err(e) => {
                warn!("User lookup failed for session: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("session_name", &self.session_name)
            .finish_non_exhaustive()
    }
}
