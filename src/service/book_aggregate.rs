//! Book Aggregate Builder: assembles everything the book page shows.
//!
//! I/O happens here and only here; the returned records are plain data that
//! `views` renders without touching the network or disk.

use crate::api::RatingsApi;
use crate::db::{BookId, LibraryStorage, UserId};
use crate::error::LibrisError;
use crate::service::cover_cache::CoverCache;
use crate::service::review_enrichment::enrich_reviews;
use crate::types::pages::{BookPage, BookRecord, BookSummary};
use tracing::debug;

/// Metadata plus rating aggregate. `None` when the book does not exist.
pub async fn load_book_record(
    storage: &LibraryStorage,
    book_id: BookId,
) -> Result<Option<BookRecord>, LibrisError> {
    let Some(book) = storage.get_book(book_id).await? else {
        return Ok(None);
    };
    let stats = storage.rating_stats(book_id).await?;
    Ok(Some(BookRecord::new(book, stats)))
}

/// Full book page. The cover and community rating are fetched concurrently and
/// both degrade on provider failure, so only storage errors fail the page.
pub async fn build_book_page(
    storage: &LibraryStorage,
    covers: &CoverCache,
    ratings: &RatingsApi,
    book_id: BookId,
    viewer: Option<UserId>,
) -> Result<BookPage, LibrisError> {
    let book = load_book_record(storage, book_id)
        .await?
        .ok_or_else(|| LibrisError::not_found("No such book"))?;

    let (cover, community) = tokio::join!(
        covers.resolve(book.book_id, &book.isbn),
        ratings.community_rating(&book.isbn),
    );

    let review_ids = storage.review_ids_for_book(book_id).await?;
    let reviews = enrich_reviews(storage, &review_ids).await?;
    let viewer_has_reviewed = viewer.is_some_and(|uid| reviews.iter().any(|r| r.user_id == uid));

    debug!(
        book_id,
        review_count = book.review_count,
        community = community.is_some(),
        "book page assembled"
    );

    Ok(BookPage {
        book,
        cover_image_path: cover.url(),
        community,
        reviews,
        viewer_has_reviewed,
    })
}

/// JSON API view keyed by ISBN; no network access.
pub async fn build_book_summary(
    storage: &LibraryStorage,
    isbn: &str,
) -> Result<Option<BookSummary>, LibrisError> {
    let Some(book) = storage.get_book_by_isbn(isbn.trim()).await? else {
        return Ok(None);
    };
    let stats = storage.rating_stats(book.book_id).await?;
    Ok(Some(BookRecord::new(book, stats).into()))
}
