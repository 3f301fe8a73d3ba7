use crate::api::default_retry_policy;
use crate::error::LibrisError;
use crate::types::google_books::VolumesResponse;
use backon::Retryable;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Book metadata provider (`volumes?q=isbn:{isbn}`).
#[derive(Clone)]
pub struct BooksApi {
    client: reqwest::Client,
    base: Url,
}

impl BooksApi {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn volumes_url(&self, isbn: &str) -> Result<Url, LibrisError> {
        let mut url = self.base.join("volumes")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("isbn:{}", isbn.trim()));
        Ok(url)
    }

    pub async fn lookup_isbn(&self, isbn: &str) -> Result<VolumesResponse, LibrisError> {
        let url = self.volumes_url(isbn)?;
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Download an image, e.g. a thumbnail link returned by `lookup_isbn`.
    pub async fn download(&self, link: &str) -> Result<Vec<u8>, LibrisError> {
        let url = Url::parse(link)?;
        self.get_bytes(url).await
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, LibrisError> {
        (|| async {
            let resp = self.client.get(url.clone()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(LibrisError::UpstreamStatus(status));
            }
            let bytes = resp.bytes().await?;
            debug!(url = %url, len = bytes.len(), "books api response");
            Ok(bytes.to_vec())
        })
        .retry(default_retry_policy())
        .when(|e: &LibrisError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("books api retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }
}
