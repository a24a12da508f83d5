//! User account handlers.
//!
//! ```text
//! POST   /users            {"email":"a@x.com","password":"secret1"}
//! GET    /private/
//! GET    /private/all
//! DELETE /private/delete
//! ```
//!
//! Responses serialise [`Credential`], which only ever emits `id` and `email`.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::Credential;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::error::map_user_repository_error;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /users`.
#[derive(Deserialize, Serialize)]
pub struct CreateUserRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password, 6 to 30 characters.
    pub password: String,
}

/// Register a new user.
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let CreateUserRequest { email, password } = payload.into_inner();
    let mut credential = Credential::new(email, password);
    let id = state
        .users
        .create(&mut credential)
        .await
        .map_err(map_user_repository_error)?;
    credential.sanitize();
    info!(user_id = %id, "user registered");
    Ok(HttpResponse::Created().json(credential))
}

/// Return the user behind the current session.
#[get("/")]
pub async fn current_user(user: AuthenticatedUser) -> web::Json<Credential> {
    web::Json(user.into_inner())
}

/// List every registered user.
#[get("/all")]
pub async fn list_users(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<Credential>>> {
    let users = state
        .users
        .find_all()
        .await
        .map_err(map_user_repository_error)?;
    Ok(web::Json(users.iter().map(Credential::sanitized).collect()))
}

/// Delete the user behind the current session.
///
/// The session cookie is left in place; the next gated request resolves to
/// an unknown identity and is rejected.
#[delete("/delete")]
pub async fn delete_current_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let Some(id) = user.credential().id() else {
        return Ok(HttpResponse::Ok().finish());
    };
    state
        .users
        .delete_by_id(id)
        .await
        .map_err(map_user_repository_error)?;
    info!(user_id = %id, "user deleted");
    Ok(HttpResponse::Ok().finish())
}
