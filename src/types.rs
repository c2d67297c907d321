//! NewType wrappers for identifiers that flow through the auth layers.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a session ID where a user ID is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// String-backed identifier, hashable and looked up by `&str` in maps.
macro_rules! id_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// A fresh random (UUIDv4) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(
    /// Stable identifier of a user record in the user store.
    UserId
);

id_type!(
    /// Opaque, server-issued session token carried in the session cookie.
    ///
    /// Every live session ID maps to exactly one `UserId`.
    SessionId
);
