use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use time::Duration;
use tracing::warn;

use crate::db::UserId;

pub const SESSION_COOKIE: &str = "libris_session";

/// The logged-in user, read from the encrypted session cookie.
/// Requests without a valid session are redirected to `/login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        session_user(&jar)
            .map(Self)
            .ok_or_else(|| Redirect::to("/login").into_response())
    }
}

pub fn session_user(jar: &PrivateCookieJar) -> Option<UserId> {
    jar.get(SESSION_COOKIE)?.value().parse().ok()
}

pub fn start_session(jar: PrivateCookieJar, user_id: UserId, secure: bool) -> PrivateCookieJar {
    jar.add(
        Cookie::build(Cookie::new(SESSION_COOKIE, user_id.to_string()))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(7))
            .build(),
    )
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

/// Cookie key from the configured secret; short secrets fall back to a random
/// per-process key, which logs everyone out on restart.
pub fn session_key(secret: &str) -> Key {
    if secret.len() >= 32 {
        Key::derive_from(secret.as_bytes())
    } else {
        warn!("session secret shorter than 32 bytes; using a random key");
        Key::generate()
    }
}
