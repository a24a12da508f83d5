//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! One parameterised statement per operation. Concurrency control is left to
//! PostgreSQL: email uniqueness comes from the table constraint, so a racing
//! duplicate insert surfaces as a conflict rather than a second row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::debug;

use crate::domain::ports::{UserRepository, UserRepositoryError, prepare_for_insert};
use crate::domain::{Credential, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// `find_all` returns users in primary-key order.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::Connection`] when no connection can be
    /// checked out and [`UserRepositoryError::Query`] when the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.batch_execute(super::USERS_TABLE_DDL)
            .await
            .map_err(|err| map_diesel_error(err, None))
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, credential: &mut Credential) -> Result<UserId, UserRepositoryError> {
        prepare_for_insert(credential)?;
        let Some(password_hash) = credential.password_hash() else {
            return Err(UserRepositoryError::query("credential has no password hash"));
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            email: credential.email(),
            password: password_hash,
        };
        let id: i64 = diesel::insert_into(users::table)
            .values(&row)
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(credential.email())))?;

        let id = UserId::new(id);
        credential.assign_id(id);
        debug!(user_id = %id, "inserted user row");
        Ok(id)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Credential, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map(Credential::from)
            .map_err(|err| map_diesel_error(err, None))
    }

    async fn find_by_email(&self, email: &str) -> Result<Credential, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map(Credential::from)
            .map_err(|err| map_diesel_error(err, None))
    }

    async fn find_all(&self) -> Result<Vec<Credential>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        Ok(rows.into_iter().map(Credential::from).collect())
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.filter(users::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        if deleted == 0 {
            debug!(user_id = %id, "delete of absent user ignored");
        }
        Ok(())
    }
}
