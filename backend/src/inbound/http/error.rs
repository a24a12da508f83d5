//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while giving Actix handlers
//! consistent JSON responses and status codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::{Value, json};
use tracing::error;

use crate::domain::ports::UserRepositoryError;
use crate::domain::{Error, ErrorCode, FieldViolation, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Self::internal("Internal server error")
    }
}

fn violation_details(violations: &[FieldViolation]) -> Value {
    let fields: Vec<Value> = violations
        .iter()
        .map(|violation| {
            json!({
                "field": violation.field.as_str(),
                "code": violation.kind.code(),
                "message": violation.message(),
            })
        })
        .collect();
    json!({ "fields": fields })
}

/// Translate a repository failure into the error returned to clients.
///
/// Storage details are logged and replaced by opaque messages.
pub fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Validation { violations } => {
            Error::unprocessable_entity("user validation failed")
                .with_details(violation_details(&violations))
        }
        UserRepositoryError::Conflict { email } => {
            Error::conflict("email is already registered").with_details(json!({ "email": email }))
        }
        UserRepositoryError::NotFound => Error::not_found("user not found"),
        UserRepositoryError::Connection { message } => {
            error!(%message, "user store connection failed");
            Error::service_unavailable("user store unavailable")
        }
        UserRepositoryError::Hashing { message } | UserRepositoryError::Query { message } => {
            error!(%message, "user store operation failed");
            Error::internal(message)
        }
    }
}
