//! Pluggable HTTP request authentication.
//!
//! Strategies (Basic, in-memory sessions, expiring sessions, persisted
//! sessions) share the [`Authenticator`] contract. The [`api`] module wires
//! the configured strategy into an axum router.

pub mod api;
pub mod auth;
mod clock;
mod config;
mod types;

// Re-export key types and functions
pub use auth::{
    Accounts, AppAuth, AuthError, Authenticator, BasicAuth, ExpiringSessions, MemorySessions,
    MemoryUserStore, PersistedSessions, SessionAuthenticator, SessionPolicy, SessionStore, User,
    UserStore, build_authenticator,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AuthConfig, AuthType, DEFAULT_EXCLUDED_PATHS, DEFAULT_SESSION_NAME,
    DEFAULT_SESSION_STORE_PATH, parse_session_duration,
};
pub use types::{SessionId, UserId};
