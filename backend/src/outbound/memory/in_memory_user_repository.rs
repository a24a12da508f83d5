//! In-process `UserRepository` for tests and local runs.
//!
//! Each instance owns its own map, so tests build a fresh repository instead
//! of sharing global state. A mutex guards each call; there is no atomicity
//! across calls.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{UserRepository, UserRepositoryError, prepare_for_insert};
use crate::domain::{Credential, UserId};

struct MemoryState {
    next_id: i64,
    users: BTreeMap<i64, Credential>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            next_id: 1,
            users: BTreeMap::new(),
        }
    }
}

/// Map-backed implementation of the `UserRepository` port.
///
/// Identifiers start at 1 and are never reused, even after deletion.
/// `find_all` returns users in insertion order.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, UserRepositoryError> {
        self.state
            .lock()
            .map_err(|_| UserRepositoryError::query("in-memory user store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, credential: &mut Credential) -> Result<UserId, UserRepositoryError> {
        prepare_for_insert(credential)?;

        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|existing| existing.email() == credential.email())
        {
            return Err(UserRepositoryError::conflict(credential.email()));
        }

        let id = UserId::new(state.next_id);
        state.next_id += 1;
        credential.assign_id(id);
        state.users.insert(id.get(), credential.sanitized());
        debug!(user_id = %id, "stored user in memory");
        Ok(id)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Credential, UserRepositoryError> {
        self.lock()?
            .users
            .get(&id.get())
            .cloned()
            .ok_or(UserRepositoryError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Credential, UserRepositoryError> {
        self.lock()?
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned()
            .ok_or(UserRepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Credential>, UserRepositoryError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), UserRepositoryError> {
        if self.lock()?.users.remove(&id.get()).is_none() {
            debug!(user_id = %id, "delete of absent user ignored");
        }
        Ok(())
    }
}
