//! Login handler.
//!
//! ```text
//! POST /sessions {"email":"a@x.com","password":"secret1"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::session::INCORRECT_CREDENTIALS;
use crate::domain::{Error, LoginCredentials, LoginValidationError, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /sessions`.
#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

/// Body returned after a successful login.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Authenticated user.
    pub user_id: UserId,
    /// Session expiry in epoch milliseconds.
    pub end_time: i64,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    debug!(reason = %err, "login rejected: blank credentials");
    Error::unauthorized(INCORRECT_CREDENTIALS)
}

/// Authenticate a user and establish a session.
///
/// Blank fields, unknown emails and wrong passwords all yield `401` with the
/// same body.
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let (_, grant) = state.sessions.login(&credentials).await?;
    session.persist_grant(&grant)?;
    info!(user_id = %grant.user_id(), "session issued");
    Ok(HttpResponse::Ok().json(SessionResponse {
        user_id: grant.user_id(),
        end_time: grant.end_time(),
    }))
}
