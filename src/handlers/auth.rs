use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

use crate::error::LibrisError;
use crate::middleware::session::{end_session, start_session};
use crate::router::LibrisState;
use crate::service::accounts;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

/// GET /login. Visiting the form forgets any current session.
pub async fn login_form(jar: PrivateCookieJar) -> impl IntoResponse {
    (end_session(jar), views::login_page())
}

/// POST /login
pub async fn login(
    State(state): State<LibrisState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let jar = end_session(jar);
    match accounts::login(
        &state.storage,
        form.username.as_deref(),
        form.password.as_deref(),
    )
    .await
    {
        Ok(user_id) => {
            info!(user_id, "user logged in");
            let jar = start_session(jar, user_id, state.secure_cookie);
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => respond_with_error(jar, err),
    }
}

/// GET /logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (end_session(jar), views::logout_page())
}

/// GET /register
pub async fn register_form() -> impl IntoResponse {
    views::register_page()
}

/// POST /register. A new account is logged in straight away.
pub async fn register(
    State(state): State<LibrisState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    match accounts::register(
        &state.storage,
        form.username.as_deref(),
        form.password.as_deref(),
        form.confirmation.as_deref(),
    )
    .await
    {
        Ok(user_id) => {
            let jar = start_session(jar, user_id, state.secure_cookie);
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => respond_with_error(jar, err),
    }
}

fn respond_with_error(jar: PrivateCookieJar, err: LibrisError) -> Response {
    (jar, err.into_response()).into_response()
}
