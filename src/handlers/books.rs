use axum::{
    Form,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::db::BookId;
use crate::error::LibrisError;
use crate::middleware::session::CurrentUser;
use crate::router::LibrisState;
use crate::service::cover_cache::image_mime;
use crate::service::{book_aggregate, library};
use crate::views;

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub book_id: Option<String>,
    pub rating: Option<String>,
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /
pub async fn index(
    State(state): State<LibrisState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, LibrisError> {
    // A session can outlive its user row.
    let Some(user) = state.storage.get_user(user_id).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    Ok(views::index_page(&user.username).into_response())
}

/// GET /books
pub async fn books_redirect(_user: CurrentUser) -> Redirect {
    Redirect::to("/")
}

/// GET /books/{book_id}
pub async fn book(
    State(state): State<LibrisState>,
    CurrentUser(user_id): CurrentUser,
    Path(book_id): Path<BookId>,
) -> Result<Html<String>, LibrisError> {
    let page = book_aggregate::build_book_page(
        &state.storage,
        &state.covers,
        &state.ratings,
        book_id,
        Some(user_id),
    )
    .await?;
    Ok(views::book_page(&page))
}

/// POST /submit_review. Resubmitting for an already reviewed book changes nothing.
pub async fn submit_review(
    State(state): State<LibrisState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, LibrisError> {
    if state.storage.get_user(user_id).await?.is_none() {
        return Ok(Redirect::to("/login"));
    }
    let book_id: BookId = form
        .book_id
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| LibrisError::validation("must provide book"))?;
    let rating = library::parse_rating(form.rating.as_deref())?;

    library::submit_review(
        &state.storage,
        user_id,
        book_id,
        rating,
        form.review.as_deref(),
    )
    .await?;
    Ok(Redirect::to(&format!("/books/{book_id}")))
}

/// GET /search?q=
pub async fn search(
    State(state): State<LibrisState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, LibrisError> {
    let books = library::search(&state.storage, query.q.as_deref()).await?;
    Ok(views::search_page(
        query.q.as_deref().unwrap_or_default().trim(),
        &books,
    ))
}

/// GET /covers/{book_id} or /covers/placeholder. Serves the cache only; never fetches.
pub async fn cover(
    State(state): State<LibrisState>,
    Path(name): Path<String>,
) -> Result<Response, LibrisError> {
    let bytes = match name.parse::<BookId>() {
        Ok(book_id) => state.covers.read(book_id).await?,
        Err(_) if name == "placeholder" => Some(state.covers.placeholder_bytes().to_vec()),
        Err(_) => None,
    };
    match bytes {
        Some(bytes) => Ok((
            [
                (header::CONTENT_TYPE, image_mime(&bytes)),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            bytes,
        )
            .into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}
