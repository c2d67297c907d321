//! Construction of the configured authentication strategy.

use std::sync::Arc;

use anyhow::Result;
use http::HeaderMap;
use tracing::info;

use crate::auth::authenticator::Authenticator;
use crate::auth::basic::BasicAuth;
use crate::auth::durable::JsonFileRecordStore;
use crate::auth::session::{MemorySessions, SessionAuthenticator, SessionPolicy};
use crate::auth::session_expiry::ExpiringSessions;
use crate::auth::session_persist::PersistedSessions;
use crate::auth::session_store::SessionStore;
use crate::auth::user_store::{User, UserStore};
use crate::config::{AuthConfig, AuthType};

/// The strategy guarding the application.
#[derive(Debug, Clone)]
pub enum AppAuth {
    Basic(BasicAuth),
    Session(SessionAuthenticator),
}

impl AppAuth {
    pub fn authenticator(&self) -> &dyn Authenticator {
        match self {
            Self::Basic(auth) => auth,
            Self::Session(auth) => auth,
        }
    }

    /// Session operations, when the strategy has them.
    pub fn sessions(&self) -> Option<&SessionAuthenticator> {
        match self {
            Self::Basic(_) => None,
            Self::Session(auth) => Some(auth),
        }
    }

    pub fn current_user(&self, request: Option<&HeaderMap>) -> Option<User> {
        self.authenticator().current_user(request)
    }
}

/// Build the strategy named by `config.auth_type`.
///
/// The persisted variant opens its session file and restores every stored
/// session into memory before returning.
pub fn build_authenticator(config: &AuthConfig, users: Arc<dyn UserStore>) -> Result<AppAuth> {
    build_with_store(config, users, Arc::new(SessionStore::new()))
}

/// Like [`build_authenticator`], with a caller-supplied session store.
pub fn build_with_store(
    config: &AuthConfig,
    users: Arc<dyn UserStore>,
    store: Arc<SessionStore>,
) -> Result<AppAuth> {
    let base = MemorySessions::new(store.clone());
    let policy: Arc<dyn SessionPolicy> = match config.auth_type {
        AuthType::BasicAuth => {
            info!("Using Basic authentication");
            return Ok(AppAuth::Basic(BasicAuth::new(users)));
        }
        AuthType::SessionAuth => Arc::new(base),
        AuthType::SessionExpAuth => {
            Arc::new(ExpiringSessions::new(base, store, config.session_duration))
        }
        AuthType::SessionDbAuth => {
            let durable = Arc::new(JsonFileRecordStore::open(&config.session_store_path)?);
            let expiring = ExpiringSessions::new(base, store.clone(), config.session_duration);
            let persisted = PersistedSessions::new(expiring, store, durable);
            persisted.restore()?;
            Arc::new(persisted)
        }
    };
    info!(
        "Using {} (session cookie `{}`, duration {}s)",
        config.auth_type, config.session_name, config.session_duration
    );
    Ok(AppAuth::Session(SessionAuthenticator::new(
        policy,
        users,
        config.session_name.clone(),
    )))
}
