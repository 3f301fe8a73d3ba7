//! Stateless clients for the third-party metadata and ratings providers.

pub mod books_api;
pub mod ratings_api;

use crate::config::Config;
use crate::error::LibrisError;
use backon::ExponentialBuilder;
use std::time::Duration;

pub use books_api::BooksApi;
pub use ratings_api::RatingsApi;

/// One shared client for all outbound calls, bounded by the configured timeout.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, LibrisError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("libris/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(cfg.http_timeout().min(Duration::from_secs(3)))
        .timeout(cfg.http_timeout());
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

pub(crate) fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(2)
        .with_jitter()
}
