//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings with a random salt, produced with the
//! `argon2` crate's default parameters. Verification reads the parameters
//! embedded in the stored string, so hashes produced with other parameters
//! remain verifiable.

use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, error};

/// Failure raised while deriving a password hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    message: String,
}

impl PasswordHashError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Underlying hasher message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Derive a salted Argon2id hash for `plaintext`.
///
/// # Errors
///
/// Returns [`PasswordHashError`] when the hasher rejects its input.
///
/// # Examples
/// ```
/// use accounts::domain::password::{hash_password, verify_password};
///
/// let hash = hash_password("secret1").expect("hash");
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("secret1", &hash));
/// ```
pub fn hash_password(plaintext: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!(error = %err, "argon2 hash_password error");
            PasswordHashError::new(err.to_string())
        })
}

/// Check `candidate` against a stored PHC hash.
///
/// A malformed hash is treated as a mismatch.
#[must_use]
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

fn placeholder_hash() -> Option<&'static str> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| hash_password("placeholder-for-absent-account").ok())
        .as_deref()
}

/// Run one verification against a fixed hash and discard the outcome.
///
/// Called when no stored hash exists, so rejecting an unknown account costs
/// one Argon2 pass like rejecting a wrong password.
pub fn verify_without_account(candidate: &str) {
    if let Some(hash) = placeholder_hash() {
        let _ = verify_password(candidate, hash);
    }
}
