//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the user repository port and the session authenticator.

use std::sync::Arc;

use crate::domain::SessionAuthenticator;
use crate::domain::ports::UserRepository;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// User storage backend.
    pub users: Arc<dyn UserRepository>,
    /// Login and session resolution service.
    pub sessions: SessionAuthenticator,
}

impl HttpState {
    /// Bundle the repository and authenticator for handlers.
    pub fn new(users: Arc<dyn UserRepository>, sessions: SessionAuthenticator) -> Self {
        Self { users, sessions }
    }
}
