use crate::db::{LibraryStorage, ReviewId};
use crate::error::LibrisError;
use crate::types::pages::ReviewView;
use futures::future::try_join_all;

/// Load each review with its author's username, keeping the order of `ids`
/// (storage returns them newest first). Ids removed in the meantime are skipped.
pub async fn enrich_reviews(
    storage: &LibraryStorage,
    ids: &[ReviewId],
) -> Result<Vec<ReviewView>, LibrisError> {
    let loaded = try_join_all(ids.iter().map(|&id| storage.review_with_author(id))).await?;
    Ok(loaded
        .into_iter()
        .flatten()
        .map(|r| ReviewView {
            rev_id: r.rev_id,
            user_id: r.user_id,
            username: r.username,
            date: r.rev_data,
            review: r.review,
            rating: r.rating,
        })
        .collect())
}
