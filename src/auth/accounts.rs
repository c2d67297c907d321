//! Registration and credential checks over the user store.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::password::{burn_verification, hash_password, verify_password};
use crate::auth::user_store::{User, UserStore};

/// Account-level failures.
///
/// Unknown email and wrong password are both `InvalidCredentials`; callers
/// cannot tell which one happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A required form field was empty or absent
    MissingField(&'static str),
    /// Registration with an email that already has an account
    EmailAlreadyRegistered(String),
    /// Unknown email or wrong password
    InvalidCredentials,
    /// The configured strategy has no sessions
    SessionsUnavailable,
    /// Store or hashing failure
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{} missing", field),
            Self::EmailAlreadyRegistered(_) => write!(f, "email already registered"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::SessionsUnavailable => write!(f, "session authentication is not enabled"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration and login checks.
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Create a user with a freshly hashed password.
    pub fn register_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        if self.users.find_by_email(email)?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered(email.to_string()));
        }

        let user = User::new(email, hash_password(password)?);
        match self.users.add(user) {
            Ok(user) => {
                info!("Registered user {}", user.id);
                Ok(user)
            }
            // Lost a race with a concurrent registration for the same email.
            Err(_) if matches!(self.users.find_by_email(email), Ok(Some(_))) => {
                Err(AuthError::EmailAlreadyRegistered(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check an email/password pair and return the matching user.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let user = match self.users.find_by_email(email) {
            Ok(user) => user,
            Err(e) => {
                warn!("User lookup failed: {}", e);
                None
            }
        };
        let Some(user) = user else {
            burn_verification(password);
            debug!("Login rejected: no matching user");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.hashed_password) {
            debug!("Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Whether the email/password pair is valid.
    pub fn valid_login(&self, email: &str, password: &str) -> bool {
        self.authenticate(email, password).is_ok()
    }
}

impl fmt::Debug for Accounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accounts").finish_non_exhaustive()
    }
}
