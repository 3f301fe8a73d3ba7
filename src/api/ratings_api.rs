use crate::api::default_retry_policy;
use crate::error::LibrisError;
use crate::types::goodreads::{CommunityRating, ReviewCountsResponse};
use backon::Retryable;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Community ratings provider (`review_counts.json?key=..&isbns=..`).
#[derive(Clone)]
pub struct RatingsApi {
    client: reqwest::Client,
    base: Url,
    key: Option<String>,
}

impl RatingsApi {
    pub fn new(client: reqwest::Client, base: Url, key: Option<String>) -> Self {
        let key = key.filter(|k| !k.trim().is_empty());
        Self { client, base, key }
    }

    pub fn review_counts_url(&self, key: &str, isbn: &str) -> Result<Url, LibrisError> {
        let mut url = self.base.join("review_counts.json")?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("isbns", isbn.trim());
        Ok(url)
    }

    /// Best-effort lookup: every failure is logged and reported as `None`.
    pub async fn community_rating(&self, isbn: &str) -> Option<CommunityRating> {
        let key = self.key.as_deref()?;
        match self.fetch(key, isbn).await {
            Ok(rating) => rating,
            Err(e) => {
                warn!(isbn, error = %e, "community rating unavailable");
                None
            }
        }
    }

    pub async fn fetch(
        &self,
        key: &str,
        isbn: &str,
    ) -> Result<Option<CommunityRating>, LibrisError> {
        let url = self.review_counts_url(key, isbn)?;
        let body = (|| async {
            let resp = self.client.get(url.clone()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(LibrisError::UpstreamStatus(status));
            }
            Ok(resp.bytes().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &LibrisError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("ratings api retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        let parsed: ReviewCountsResponse = serde_json::from_slice(&body)?;
        let rating = parsed.into_rating();
        debug!(isbn, ?rating, "ratings api response");
        Ok(rating)
    }
}
