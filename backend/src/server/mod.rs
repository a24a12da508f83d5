//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;
use std::time::Duration;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};

use accounts::Trace;
use accounts::domain::SessionAuthenticator;
use accounts::inbound::http::auth::RequireSession;
use accounts::inbound::http::health::{HealthState, live, ready};
use accounts::inbound::http::routes::{configure_private, configure_public};
use accounts::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
    cookie_name: String,
    session_ttl: Duration,
}

fn cookie_ttl(ttl: Duration) -> actix_web::cookie::time::Duration {
    let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    actix_web::cookie::time::Duration::seconds(secs)
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
        cookie_name,
        session_ttl,
    } = deps;

    let gate = RequireSession::new(http_state.sessions.clone(), cookie_name.clone());
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(cookie_name)
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(cookie_ttl(session_ttl)))
        .build();

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .configure(configure_public)
        .configure(configure_private(gate))
        .service(ready)
        .service(live)
        .wrap(session)
        .wrap(Trace)
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// Readiness is flipped once the listener is bound. Actix's own signal
/// handling is disabled; pair the server with [`drain_on_signal`].
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        cookie_name,
        session_ttl,
        bind_addr,
        users,
    } = config;

    let sessions = SessionAuthenticator::new(Arc::clone(&users), Arc::new(DefaultClock), session_ttl);
    let http_state = web::Data::new(HttpState::new(users, sessions));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
            cookie_name: cookie_name.clone(),
            session_ttl,
        })
    })
    .disable_signals()
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use actix_web::rt::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = actix_web::rt::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        actix_web::rt::signal::ctrl_c().await
    }
}

/// Fail liveness, then stop the server gracefully.
async fn drain(health_state: &HealthState, handle: ServerHandle) {
    health_state.mark_unhealthy();
    info!("shutdown requested, draining connections");
    handle.stop(true).await;
}

/// Drain `server` when SIGINT or SIGTERM arrives.
pub fn drain_on_signal(server: &Server, health_state: web::Data<HealthState>) {
    let handle = server.handle();
    actix_web::rt::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => drain(&health_state, handle).await,
            Err(error) => warn!(%error, "failed to listen for shutdown signals"),
        }
    });
}
