//! Mapping from pool and Diesel failures to `UserRepositoryError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::UserRepositoryError;

use super::pool::PoolError;

/// Map pool failures to connection errors.
pub(super) fn map_pool_error(error: PoolError) -> UserRepositoryError {
    debug!(error = %error, "database pool checkout failed");
    UserRepositoryError::connection(error.message())
}

/// Map Diesel failures, reporting unique violations as conflicts on `email`.
pub(super) fn map_diesel_error(error: DieselError, email: Option<&str>) -> UserRepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match (error, email) {
        (DieselError::NotFound, _) => UserRepositoryError::NotFound,
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(email)) => {
            UserRepositoryError::conflict(email)
        }
        (DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _), _) => {
            UserRepositoryError::connection("database connection error")
        }
        (DieselError::QueryBuilderError(_), _) => UserRepositoryError::query("database query error"),
        _ => UserRepositoryError::query("database error"),
    }
}
