//! Plain display records produced by the services and consumed by `views` and the JSON API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{BookId, DbBook, DbRatingStats, ReviewId, UserId};
use crate::types::goodreads::CommunityRating;

/// Book metadata plus its derived rating statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub book_id: BookId,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub review_count: i64,
    /// Rounded to two decimals; `None` until the first review.
    pub average_rating: Option<f64>,
}

impl BookRecord {
    pub fn new(book: DbBook, stats: DbRatingStats) -> Self {
        Self {
            book_id: book.book_id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            year: book.year,
            review_count: stats.review_count,
            average_rating: stats.average_rating.map(round2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub rev_id: ReviewId,
    pub user_id: UserId,
    pub username: String,
    pub date: DateTime<Utc>,
    pub review: String,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPage {
    pub book: BookRecord,
    pub cover_image_path: String,
    pub community: Option<CommunityRating>,
    pub reviews: Vec<ReviewView>,
    pub viewer_has_reviewed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReviewView {
    pub book_id: BookId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub review: String,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPage {
    pub user_id: UserId,
    pub username: String,
    pub reviews: Vec<UserReviewView>,
}

/// `/api/{isbn}` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub isbn: String,
    pub review_count: i64,
    pub average_score: Option<f64>,
}

impl From<BookRecord> for BookSummary {
    fn from(b: BookRecord) -> Self {
        Self {
            title: b.title,
            author: b.author,
            year: b.year,
            isbn: b.isbn,
            review_count: b.review_count,
            average_score: b.average_rating,
        }
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        let book = DbBook {
            book_id: 1,
            isbn: "1".into(),
            title: "t".into(),
            author: "a".into(),
            year: 2000,
        };
        let rec = BookRecord::new(
            book,
            DbRatingStats {
                review_count: 3,
                average_rating: Some(11.0 / 3.0),
            },
        );
        assert_eq!(rec.average_rating, Some(3.67));
    }

    #[test]
    fn summary_serializes_null_average() {
        let summary = BookSummary {
            title: "t".into(),
            author: "a".into(),
            year: 2000,
            isbn: "1".into(),
            review_count: 0,
            average_score: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["review_count"], 0);
        assert!(json["average_score"].is_null());
    }
}
