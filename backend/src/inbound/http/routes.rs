//! Route table for the account API.
//!
//! ```text
//! POST   /users            public
//! POST   /sessions         public
//! GET    /private/         session required
//! GET    /private/all      session required
//! DELETE /private/delete   session required
//! ```
//!
//! The cookie-session middleware is applied by the caller so tests can supply
//! their own key and cookie settings.

use actix_web::web;
use tracing::debug;

use crate::domain::Error;
use crate::inbound::http::auth::RequireSession;
use crate::inbound::http::sessions::create_session;
use crate::inbound::http::users::{create_user, current_user, delete_current_user, list_users};

/// JSON extractor settings shared by every body-bearing route.
///
/// Malformed or mistyped bodies become `400 invalid_request` in the common
/// error envelope instead of Actix's plain-text default.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejected request body");
        Error::invalid_request(format!("invalid request body: {err}")).into()
    })
}

/// Register the unauthenticated routes.
pub fn configure_public(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(create_user)
        .service(create_session);
}

/// Register the `/private` scope behind `gate`.
pub fn configure_private(gate: RequireSession) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/private")
                .wrap(gate)
                .service(current_user)
                .service(list_users)
                .service(delete_current_user),
        );
    }
}
