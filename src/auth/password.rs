//! Password hashing and verification with Argon2id.
//!
//! - [`hash_password`] salts with [`OsRng`] and returns a PHC-format string
//!   (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`). Two calls on the same input
//!   produce different strings.
//! - [`verify_password`] parses a PHC string and checks the plaintext against it.
//!   The digest comparison inside `argon2` is constant-time.
//! - [`burn_verification`] runs a verification against a throwaway hash so that
//!   "unknown user" costs the same as "wrong password".

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::warn;

static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dummy password for timing").ok());

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
///
/// A malformed stored hash is treated as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spend the cost of one verification without a real account behind it.
pub fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same", &first));
        assert!(verify_password("same", &second));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_empty_password_round_trips() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash));
        assert!(!verify_password(" ", &hash));
    }

    #[test]
    fn test_burn_verification_does_not_panic() {
        burn_verification("whatever");
    }
}
