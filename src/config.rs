use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Runtime configuration. Defaults are overridden by `LIBRIS_*` environment variables,
/// e.g. `LIBRIS_DATABASE_URL`, `LIBRIS_RATINGS_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    /// Directory holding `{book_id}.png` cover files.
    pub cover_dir: PathBuf,
    /// Image served when a cover cannot be obtained. A built-in image is used if unset or unreadable.
    pub placeholder_cover: Option<PathBuf>,
    pub books_api_url: Url,
    pub ratings_api_url: Url,
    /// Ratings lookups are skipped entirely without a key.
    pub ratings_api_key: Option<String>,
    /// Master key for the session cookie; needs at least 32 bytes, otherwise a random key is used.
    pub session_secret: String,
    pub http_timeout_secs: u64,
    pub proxy: Option<Url>,
    pub insecure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:libris.sqlite".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            cover_dir: PathBuf::from("covers"),
            placeholder_cover: None,
            books_api_url: Url::parse("https://www.googleapis.com/books/v1/")
                .expect("static books api url"),
            ratings_api_url: Url::parse("https://www.goodreads.com/book/")
                .expect("static ratings api url"),
            ratings_api_key: None,
            session_secret: String::new(),
            http_timeout_secs: 5,
            proxy: None,
            insecure_cookie: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("LIBRIS_"))
            .extract()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid LIBRIS_* configuration"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_providers() {
        let cfg = Config::default();
        assert_eq!(cfg.books_api_url.host_str(), Some("www.googleapis.com"));
        assert!(cfg.ratings_api_key.is_none());
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config {
            http_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.http_timeout(), Duration::from_secs(1));
    }
}
