use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;
pub type BookId = i64;
pub type ReviewId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUser {
    pub user_id: UserId,
    pub username: String,
    pub hash_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbBook {
    pub book_id: BookId,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub year: i64,
}

/// Review row joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbReview {
    pub rev_id: ReviewId,
    pub user_id: UserId,
    pub username: String,
    pub book_id: BookId,
    pub rev_data: DateTime<Utc>,
    pub review: String,
    pub rating: i64,
}

/// Review row joined with the reviewed book's title, for user pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUserReview {
    pub rev_id: ReviewId,
    pub book_id: BookId,
    pub title: String,
    pub rev_data: DateTime<Utc>,
    pub review: String,
    pub rating: i64,
}

/// Raw aggregate over a book's reviews. `average_rating` is NULL without reviews.
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct DbRatingStats {
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

/// Result of a lookup-before-insert review submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewInsert {
    Created(ReviewId),
    AlreadyReviewed(ReviewId),
}
