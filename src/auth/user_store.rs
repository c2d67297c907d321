//! User records and the keyed lookup store behind them.

use std::collections::HashMap;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// An application user.
///
/// The password hash is never serialized, so a `User` can be returned
/// directly from HTTP handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh ID from an already-hashed password.
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            created_at: Utc::now(),
        }
    }
}

/// Keyed lookup over user records.
pub trait UserStore: Send + Sync {
    /// Find the user with this email, if any.
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by its ID.
    fn find_by_id(&self, id: &UserId) -> Result<Option<User>>;

    /// Insert a new user. Fails if the email is already taken.
    fn add(&self, user: User) -> Result<User>;
}

/// In-process user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    fn add(&self, user: User) -> Result<User> {
        // Check and insert under one write lock so two registrations can't race.
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            bail!("User {} already exists", user.email);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
