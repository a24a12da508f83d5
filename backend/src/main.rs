//! Account service entry-point: loads configuration, selects the user store
//! and serves the REST endpoints.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use accounts::domain::ports::UserRepository;
use accounts::inbound::http::health::HealthState;
use accounts::inbound::http::session_config::{BuildMode, session_settings_from_env};
use accounts::outbound::memory::InMemoryUserRepository;
use accounts::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use accounts::settings::ServerSettings;

use server::{ServerConfig, create_server, drain_on_signal};

async fn build_user_repository(
    settings: &ServerSettings,
) -> std::io::Result<Arc<dyn UserRepository>> {
    let Some(database_url) = settings.database_url() else {
        warn!("ACCOUNTS_DATABASE_URL not set; using in-memory user store (data is not persisted)");
        return Ok(Arc::new(InMemoryUserRepository::new()));
    };

    let config = PoolConfig::new(database_url).with_max_size(settings.db_pool_size());
    let pool = DbPool::new(config)
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {}", err.message())))?;
    let repository = DieselUserRepository::new(pool);
    repository
        .ensure_schema()
        .await
        .map_err(|err| std::io::Error::other(format!("users table: {err}")))?;
    info!(pool_size = settings.db_pool_size(), "using PostgreSQL user store");
    Ok(Arc::new(repository))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_env()?;
    let session_settings =
        session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr()?;
    let users = build_user_repository(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(session_settings, bind_addr, users);
    let server = create_server(health_state.clone(), config)?;
    drain_on_signal(&server, health_state);
    info!(%bind_addr, "listening");
    server.await
}
