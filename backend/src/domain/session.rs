//! Session issue and resolution.
//!
//! [`SessionAuthenticator`] owns the login check and the per-request state
//! machine that turns a decoded session into an authenticated user. It only
//! sees plain values (`user_id`, `end_time`); reading and writing the cookie
//! is left to the inbound adapter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{debug, error, warn};

use super::auth::LoginCredentials;
use super::credential::{Credential, UserId};
use super::password;
use super::ports::{UserRepository, UserRepositoryError};
use super::Error;

/// Session lifetime applied when no override is configured: one day.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Message returned for every rejected login.
pub const INCORRECT_CREDENTIALS: &str = "incorrect email or password";
const NOT_AUTHENTICATED: &str = "not authenticated";

/// Values read back from the session store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Identity recorded at login.
    pub user_id: Option<UserId>,
    /// Absolute expiry in epoch milliseconds.
    pub end_time: Option<i64>,
}

/// Values written to the session store after a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGrant {
    user_id: UserId,
    end_time: i64,
}

impl SessionGrant {
    /// Build a grant from explicit values.
    #[must_use]
    pub const fn new(user_id: UserId, end_time: i64) -> Self {
        Self { user_id, end_time }
    }

    /// Authenticated user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Absolute expiry in epoch milliseconds.
    #[must_use]
    pub const fn end_time(&self) -> i64 {
        self.end_time
    }
}

/// Terminal states of session resolution other than success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// The session store could not be read.
    SessionLookupFailed,
    /// The session carries no user id.
    SessionMissingIdentity,
    /// The session has no expiry or the expiry has passed.
    SessionExpired,
    /// The recorded user no longer resolves.
    IdentityNotFound,
}

impl AuthRejection {
    /// Convert the rejection into the error returned to callers.
    ///
    /// Only a store failure is an internal error; every other state shares
    /// one unauthorised response.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            Self::SessionLookupFailed => Error::internal("failed to read session"),
            Self::SessionMissingIdentity | Self::SessionExpired | Self::IdentityNotFound => {
                Error::unauthorized(NOT_AUTHENTICATED)
            }
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SessionLookupFailed => "session lookup failed",
            Self::SessionMissingIdentity => "session missing identity",
            Self::SessionExpired => "session expired",
            Self::IdentityNotFound => "identity not found",
        };
        f.write_str(label)
    }
}

/// Issues and resolves sessions against a user repository.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use accounts::domain::session::{SessionAuthenticator, DEFAULT_SESSION_TTL};
/// use accounts::outbound::memory::InMemoryUserRepository;
/// use mockable::DefaultClock;
///
/// let authenticator = SessionAuthenticator::new(
///     Arc::new(InMemoryUserRepository::new()),
///     Arc::new(DefaultClock),
///     DEFAULT_SESSION_TTL,
/// );
/// assert_eq!(authenticator.ttl(), DEFAULT_SESSION_TTL);
/// ```
#[derive(Clone)]
pub struct SessionAuthenticator {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
    ttl: Duration,
}

impl SessionAuthenticator {
    /// Build an authenticator with an injected repository, clock and TTL.
    pub fn new(
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
        ttl: Duration,
    ) -> Self {
        Self { users, clock, ttl }
    }

    /// Configured session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn now_millis(&self) -> i64 {
        self.clock.utc().timestamp_millis()
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Create a grant for `user_id` expiring one TTL from now.
    #[must_use]
    pub fn issue(&self, user_id: UserId) -> SessionGrant {
        SessionGrant::new(user_id, self.now_millis().saturating_add(self.ttl_millis()))
    }

    /// Verify login credentials and issue a session grant.
    ///
    /// Unknown emails and wrong passwords produce the same unauthorised error.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] with `unauthorized` for bad credentials, or an
    /// internal/service-unavailable error when the repository fails.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<(Credential, SessionGrant), Error> {
        let user = match self.users.find_by_email(credentials.email()).await {
            Ok(user) => user,
            Err(UserRepositoryError::NotFound) => {
                password::verify_without_account(credentials.password());
                debug!("login rejected: unknown email");
                return Err(Error::unauthorized(INCORRECT_CREDENTIALS));
            }
            Err(err) => {
                error!(error = %err, "user lookup failed during login");
                return Err(match err {
                    UserRepositoryError::Connection { .. } => {
                        Error::service_unavailable("user store unavailable")
                    }
                    _ => Error::internal("user lookup failed"),
                });
            }
        };

        if !user.verify_password(credentials.password()) {
            debug!("login rejected: password mismatch");
            return Err(Error::unauthorized(INCORRECT_CREDENTIALS));
        }

        let Some(user_id) = user.id() else {
            error!("stored user has no identifier");
            return Err(Error::internal("stored user has no identifier"));
        };

        Ok((user.sanitized(), self.issue(user_id)))
    }

    /// Run the resolution state machine for one request.
    ///
    /// States are evaluated in order: store read, identity present, expiry,
    /// identity lookup. The first failing state is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthRejection`] describing the failing state.
    pub async fn resolve<E>(
        &self,
        lookup: Result<SessionSnapshot, E>,
    ) -> Result<Credential, AuthRejection>
    where
        E: fmt::Display,
    {
        let snapshot = lookup.map_err(|err| {
            error!(error = %err, "failed to read session");
            AuthRejection::SessionLookupFailed
        })?;

        let Some(user_id) = snapshot.user_id else {
            return Err(AuthRejection::SessionMissingIdentity);
        };

        let now = self.now_millis();
        match snapshot.end_time {
            Some(end_time) if now <= end_time => {}
            end_time => {
                warn!(user_id = %user_id, ?end_time, now, "session expired");
                return Err(AuthRejection::SessionExpired);
            }
        }

        match self.users.find_by_id(user_id).await {
            Ok(user) => Ok(user.sanitized()),
            Err(UserRepositoryError::NotFound) => {
                warn!(user_id = %user_id, "session user no longer exists");
                Err(AuthRejection::IdentityNotFound)
            }
            Err(err) => {
                error!(user_id = %user_id, error = %err, "session user lookup failed");
                Err(AuthRejection::IdentityNotFound)
            }
        }
    }
}
