//! Port abstraction for user storage adapters and their errors.
//!
//! Every adapter honours the same contract so the session authenticator and
//! HTTP handlers behave identically whichever backend is wired in.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::credential::{Credential, CredentialValidationError, FieldViolation, UserId};
use crate::domain::password::PasswordHashError;

/// Errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserRepositoryError {
    /// The credential failed field validation; nothing was stored.
    #[error("user validation failed")]
    Validation { violations: Vec<FieldViolation> },
    /// Another user already owns the email.
    #[error("email {email} is already registered")]
    Conflict { email: String },
    /// No user matched the lookup.
    #[error("user not found")]
    NotFound,
    /// Password hash derivation failed.
    #[error("user password hashing failed: {message}")]
    Hashing { message: String },
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
}

impl UserRepositoryError {
    /// Create a conflict error for `email`.
    pub fn conflict(email: impl Into<String>) -> Self {
        Self::Conflict {
            email: email.into(),
        }
    }

    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

impl From<CredentialValidationError> for UserRepositoryError {
    fn from(error: CredentialValidationError) -> Self {
        Self::Validation {
            violations: error.into_violations(),
        }
    }
}

impl From<PasswordHashError> for UserRepositoryError {
    fn from(error: PasswordHashError) -> Self {
        Self::Hashing {
            message: error.message().to_owned(),
        }
    }
}

/// Validate a credential and derive its hash ahead of insertion.
///
/// Adapters call this first in [`UserRepository::create`].
///
/// # Errors
///
/// Returns [`UserRepositoryError::Validation`] or
/// [`UserRepositoryError::Hashing`].
pub fn prepare_for_insert(credential: &mut Credential) -> Result<(), UserRepositoryError> {
    credential.validate()?;
    credential.derive_credentials()?;
    Ok(())
}

/// Storage contract for user credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Validate, hash and store a new credential.
    ///
    /// On success the assigned id is written back into `credential`. The stored
    /// copy never contains the plaintext password.
    async fn create(&self, credential: &mut Credential) -> Result<UserId, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Credential, UserRepositoryError>;

    /// Fetch a user by login email.
    async fn find_by_email(&self, email: &str) -> Result<Credential, UserRepositoryError>;

    /// Fetch every stored user.
    async fn find_all(&self) -> Result<Vec<Credential>, UserRepositoryError>;

    /// Delete a user. Deleting an absent id succeeds.
    async fn delete_by_id(&self, id: UserId) -> Result<(), UserRepositoryError>;
}
