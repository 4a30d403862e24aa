//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{HttpResponse, web};

use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;

/// Path of the route installed by [`seed_session_route`].
pub const SEED_SESSION_PATH: &str = "/__test/session/{user_id}";

/// Session middleware with a fresh key and the `Secure` flag off for plain
/// HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

async fn seed_session(
    session: SessionContext,
    user_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| Error::invalid_request("user id must be a UUID"))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Route standing in for the auth service: signs in the user in the path.
pub fn seed_session_route() -> actix_web::Route {
    web::get().to(seed_session)
}

/// Extract the session cookie from a response, owned for reuse.
pub fn session_cookie<B>(response: &actix_web::dev::ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
