//! HTTP Basic authentication against the user store.

use std::sync::Arc;

use http::HeaderMap;

use crate::auth::accounts::Accounts;
use crate::auth::authenticator::Authenticator;
use crate::auth::credentials::{self, Credentials};
use crate::auth::user_store::{User, UserStore};

/// Authenticates each request from its `Authorization: Basic` header.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    accounts: Accounts,
}

impl BasicAuth {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            accounts: Accounts::new(users),
        }
    }

    /// Look up the user by email and check the password.
    ///
    /// Unknown email, store failure and wrong password all return `None`.
    pub fn user_from_credentials(&self, email: &str, password: &str) -> Option<User> {
        self.accounts.authenticate(email, password).ok()
    }
}

impl Authenticator for BasicAuth {
    fn current_user(&self, request: Option<&HeaderMap>) -> Option<User> {
        let header = self.authorization_header(request);
        let Credentials { email, password } = credentials::credentials_from_header(header)?;
        self.user_from_credentials(&email, &password)
    }
}
