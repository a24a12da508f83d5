//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix session so the rest of the adapter only deals with a
//! [`SessionGrant`] on the way in and a [`SessionSnapshot`] on the way out.

use actix_session::{Session, SessionGetError};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, SessionGrant, SessionSnapshot, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const END_TIME_KEY: &str = "end_time";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store a login grant, rotating the session key first.
    ///
    /// # Errors
    ///
    /// Returns an internal [`Error`] when the values cannot be serialised.
    pub fn persist_grant(&self, grant: &SessionGrant) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, grant.user_id().get())
            .and_then(|()| self.0.insert(END_TIME_KEY, grant.end_time()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Read the identity and expiry recorded at login.
    ///
    /// # Errors
    ///
    /// Returns [`SessionGetError`] when a stored value cannot be decoded.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionGetError> {
        let user_id = self.0.get::<i64>(USER_ID_KEY)?.map(UserId::new);
        let end_time = self.0.get::<i64>(END_TIME_KEY)?;
        Ok(SessionSnapshot { user_id, end_time })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
