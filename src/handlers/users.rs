use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};

use crate::db::UserId;
use crate::error::LibrisError;
use crate::middleware::session::CurrentUser;
use crate::router::LibrisState;
use crate::service::library;
use crate::views;

/// GET /users -> the caller's own page.
pub async fn users_redirect(CurrentUser(user_id): CurrentUser) -> Redirect {
    Redirect::to(&format!("/users/{user_id}"))
}

/// GET /users/{user_id}
pub async fn user(
    State(state): State<LibrisState>,
    _viewer: CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Html<String>, LibrisError> {
    let page = library::user_page(&state.storage, user_id).await?;
    Ok(views::user_page(&page))
}
