//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use accounts::domain::ports::UserRepository;
use accounts::inbound::http::session_config::SessionSettings;

/// Everything the server needs to build each worker's app.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) users: Arc<dyn UserRepository>,
}

impl ServerConfig {
    /// Combine validated session settings, the bind address and the chosen
    /// user store.
    #[must_use]
    pub fn new(
        session: SessionSettings,
        bind_addr: SocketAddr,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
            cookie_name,
            ttl,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            cookie_name,
            session_ttl: ttl,
            bind_addr,
            users,
        }
    }
}
