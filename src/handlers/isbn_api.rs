use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::LibrisError;
use crate::router::LibrisState;
use crate::service::book_aggregate::build_book_summary;

/// GET /api/{isbn}. Public; unknown ISBNs get `404 {"error": ...}`.
pub async fn book_by_isbn(
    State(state): State<LibrisState>,
    Path(isbn): Path<String>,
) -> Result<Response, LibrisError> {
    match build_book_summary(&state.storage, &isbn).await? {
        Some(summary) => Ok(Json(summary).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Invalid ISBN", "isbn": isbn })),
        )
            .into_response()),
    }
}
