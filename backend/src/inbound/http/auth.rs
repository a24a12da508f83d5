//! Session gate for protected routes.
//!
//! [`RequireSession`] resolves the caller's session before the wrapped service
//! runs. On success the resolved user is stored in the request extensions and
//! handlers receive it through the [`AuthenticatedUser`] extractor. On any
//! rejection the request is answered directly and the session cookie is
//! cleared.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, warn};

use crate::domain::{Credential, Error, SessionAuthenticator};

use super::session::SessionContext;

/// The user resolved from a valid session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Credential);

impl AuthenticatedUser {
    /// The resolved credential, without password material.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.0
    }

    /// Consume the wrapper.
    #[must_use]
    pub fn into_inner(self) -> Credential {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Self>()
                .cloned()
                .ok_or_else(|| Error::unauthorized("not authenticated")),
        )
    }
}

/// Middleware factory that rejects requests without a valid session.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use actix_web::{App, web};
/// use accounts::domain::session::{SessionAuthenticator, DEFAULT_SESSION_TTL};
/// use accounts::inbound::http::auth::RequireSession;
/// use accounts::outbound::memory::InMemoryUserRepository;
/// use mockable::DefaultClock;
///
/// let authenticator = SessionAuthenticator::new(
///     Arc::new(InMemoryUserRepository::new()),
///     Arc::new(DefaultClock),
///     DEFAULT_SESSION_TTL,
/// );
/// let _app = App::new().service(
///     web::scope("/private").wrap(RequireSession::new(authenticator, "session")),
/// );
/// ```
#[derive(Clone)]
pub struct RequireSession {
    authenticator: SessionAuthenticator,
    cookie_name: Rc<str>,
}

impl RequireSession {
    /// Gate requests using `authenticator`; `cookie_name` is cleared on
    /// rejection.
    pub fn new(authenticator: SessionAuthenticator, cookie_name: impl Into<String>) -> Self {
        Self {
            authenticator,
            cookie_name: Rc::from(cookie_name.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequireSessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionMiddleware {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
            cookie_name: Rc::clone(&self.cookie_name),
        }))
    }
}

/// Service wrapper produced by [`RequireSession`].
pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
    authenticator: SessionAuthenticator,
    cookie_name: Rc<str>,
}

fn rejection_response(error: Error, cookie_name: &str) -> HttpResponse {
    let mut response = HttpResponse::from_error(error);
    let mut removal = Cookie::new(cookie_name.to_owned(), "");
    removal.set_path("/");
    if let Err(err) = response.add_removal_cookie(&removal) {
        error!(error = %err, "failed to attach session removal cookie");
    }
    response
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let authenticator = self.authenticator.clone();
        let cookie_name = Rc::clone(&self.cookie_name);

        Box::pin(async move {
            let lookup = SessionContext::new(req.get_session()).snapshot();
            match authenticator.resolve(lookup).await {
                Ok(user) => {
                    req.extensions_mut().insert(AuthenticatedUser(user));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(rejection) => {
                    warn!(%rejection, path = req.path(), "request rejected by session gate");
                    let response = rejection_response(rejection.into_error(), &cookie_name);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::session::DEFAULT_SESSION_TTL;
    use crate::domain::{SessionGrant, UserId};
    use crate::domain::ports::{MockUserRepository, UserRepositoryError};
    use crate::inbound::http::test_utils::{TEST_COOKIE_NAME, test_session_middleware};
    use crate::test_support::MutableClock;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn authenticator(repo: MockUserRepository) -> SessionAuthenticator {
        let now = DateTime::<Utc>::from_timestamp_millis(NOW_MS).expect("valid timestamp");
        SessionAuthenticator::new(
            Arc::new(repo),
            Arc::new(MutableClock::new(now)),
            DEFAULT_SESSION_TTL,
        )
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.credential().email().to_owned())
    }

    /// Issue a session carrying `grant`, then call the gated route with it.
    async fn call_gated(
        repo: MockUserRepository,
        grant: Option<SessionGrant>,
    ) -> (StatusCode, bool, web::Bytes) {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/login",
                    web::post().to(move |session: SessionContext| async move {
                        if let Some(grant) = grant {
                            session.persist_grant(&grant)?;
                        }
                        Ok::<_, Error>(HttpResponse::Ok().finish())
                    }),
                )
                .service(
                    web::scope("/private")
                        .wrap(RequireSession::new(authenticator(repo), TEST_COOKIE_NAME))
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;

        let login = test::call_service(&app, test::TestRequest::post().uri("/login").to_request())
            .await;
        let cookie: Option<Cookie<'static>> = login
            .response()
            .cookies()
            .find(|cookie| cookie.name() == TEST_COOKIE_NAME)
            .map(Cookie::into_owned);

        let mut request = test::TestRequest::get().uri("/private/me");
        if let Some(cookie) = cookie {
            request = request.cookie(cookie);
        }
        let res = test::call_service(&app, request.to_request()).await;
        let status = res.status();
        let cleared = res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == TEST_COOKIE_NAME && cookie.value().is_empty());
        (status, cleared, test::read_body(res).await)
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_session_reaches_handler() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| {
            Ok(Credential::from_stored(id, "a@x.com", "$argon2id$stub"))
        });

        let (status, cleared, body) =
            call_gated(repo, Some(SessionGrant::new(UserId::new(1), NOW_MS + 1))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!cleared);
        assert_eq!(body, "a@x.com");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(SessionGrant::new(UserId::new(1), NOW_MS - 1)))]
    #[actix_web::test]
    async fn missing_or_expired_session_is_rejected(#[case] grant: Option<SessionGrant>) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().never();

        let (status, cleared, _) = call_gated(repo, grant).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(cleared);
    }

    #[rstest]
    #[actix_web::test]
    async fn deleted_user_is_rejected() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(UserRepositoryError::NotFound));

        let (status, cleared, _) =
            call_gated(repo, Some(SessionGrant::new(UserId::new(1), NOW_MS + 1))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(cleared);
    }
}
