//! Request authentication.
//!
//! Every strategy implements [`Authenticator`]: decide whether a path needs
//! auth, read the `Authorization` header, and resolve the calling [`User`].
//! Any failure along the way resolves to `None`; nothing here returns an
//! error to the HTTP layer for a bad credential.
//!
//! - **Basic**: `Authorization: Basic base64(email:password)`, checked against
//!   the user store with Argon2id verification
//! - **Session**: an opaque session ID in a cookie, resolved through a
//!   [`SessionPolicy`]
//!
//! ## Session layers
//!
//! Session policies compose by wrapping:
//!
//! ```text
//! PersistedSessions          durable record must exist
//!   └─ ExpiringSessions      created_at + duration >= now
//!        └─ MemorySessions   in-memory SessionStore
//! ```
//!
//! All layers share one injected [`SessionStore`], which owns its lock and
//! clock.

mod accounts;
mod authenticator;
mod basic;
pub mod credentials;
mod durable;
pub mod password;
mod session;
mod session_expiry;
mod session_persist;
mod session_store;
mod strategy;
mod user_store;

pub use accounts::{Accounts, AuthError};
pub use authenticator::{Authenticator, cookie_value, require_auth};
pub use basic::BasicAuth;
pub use credentials::Credentials;
pub use durable::{DurableSessionStore, JsonFileRecordStore, MemoryRecordStore, SessionRecord};
pub use session::{MemorySessions, SessionAuthenticator, SessionPolicy};
pub use session_expiry::ExpiringSessions;
pub use session_persist::PersistedSessions;
pub use session_store::{SessionEntry, SessionStore};
pub use strategy::{AppAuth, build_authenticator, build_with_store};
pub use user_store::{MemoryUserStore, User, UserStore};
