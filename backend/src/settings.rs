//! Server settings loaded via OrthoConfig.
//!
//! Values come from `ACCOUNTS_*` environment variables, an optional config
//! file, or command-line flags. Session cookie settings are read separately
//! by [`crate::inbound::http::session_config`].

use std::ffi::OsString;
use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_POOL_SIZE: u32 = 10;

/// Listener and storage settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNTS")]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Postgres connection URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
}

impl ServerSettings {
    /// Load settings from the process environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns an I/O error describing the configuration failure.
    pub fn load_from_env() -> std::io::Result<Self> {
        Self::load_from_iter([OsString::from("accounts")])
            .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))
    }

    /// Interface to bind, defaulting to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Port to bind, defaulting to 8080.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Resolve the bind address.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the host is not an IP address.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = format!("{}:{}", self.host(), self.port());
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address {raw}: {err}"),
            )
        })
    }

    /// Postgres URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, defaulting to 10 and never below 1.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE).max(1)
    }
}
