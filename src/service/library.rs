use crate::db::{BookId, DbBook, LibraryStorage, ReviewInsert, UserId};
use crate::error::LibrisError;
use crate::types::pages::{UserPage, UserReviewView};
use chrono::Utc;
use tracing::{debug, info};

/// Parse a form rating into 1..=5.
pub fn parse_rating(raw: Option<&str>) -> Result<i64, LibrisError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LibrisError::validation("must provide rating"))?;
    match raw.parse::<i64>() {
        Ok(r) if (1..=5).contains(&r) => Ok(r),
        _ => Err(LibrisError::validation("rating must be a number from 1 to 5")),
    }
}

/// Record a review unless the user already reviewed this book; the first one is kept.
pub async fn submit_review(
    storage: &LibraryStorage,
    user_id: UserId,
    book_id: BookId,
    rating: i64,
    text: Option<&str>,
) -> Result<ReviewInsert, LibrisError> {
    if storage.get_book(book_id).await?.is_none() {
        return Err(LibrisError::not_found("No such book"));
    }
    let text = text.map(str::trim).unwrap_or_default();
    let outcome = storage
        .insert_review_once(user_id, book_id, rating, text, Utc::now())
        .await?;
    match outcome {
        ReviewInsert::Created(rev_id) => info!(user_id, book_id, rev_id, rating, "review stored"),
        ReviewInsert::AlreadyReviewed(rev_id) => {
            debug!(user_id, book_id, rev_id, "duplicate review ignored")
        }
    }
    Ok(outcome)
}

pub async fn search(storage: &LibraryStorage, query: Option<&str>) -> Result<Vec<DbBook>, LibrisError> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| LibrisError::validation("must provide search query"))?;
    storage.search_books(query).await
}

pub async fn user_page(storage: &LibraryStorage, user_id: UserId) -> Result<UserPage, LibrisError> {
    let user = storage
        .get_user(user_id)
        .await?
        .ok_or_else(|| LibrisError::not_found("No such user"))?;
    let reviews = storage
        .reviews_by_user(user_id)
        .await?
        .into_iter()
        .map(|r| UserReviewView {
            book_id: r.book_id,
            title: r.title,
            date: r.rev_data,
            review: r.review,
            rating: r.rating,
        })
        .collect();
    Ok(UserPage {
        user_id: user.user_id,
        username: user.username,
        reviews,
    })
}
