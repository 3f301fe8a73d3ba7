use crate::api::BooksApi;
use crate::db::BookId;
use crate::error::LibrisError;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// 1x1 transparent PNG used when no placeholder file is configured.
const BUILTIN_PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverImage {
    Cached { book_id: BookId, path: PathBuf },
    Placeholder,
}

impl CoverImage {
    /// Path under which the router serves this image.
    pub fn url(&self) -> String {
        match self {
            CoverImage::Cached { book_id, .. } => format!("/covers/{book_id}"),
            CoverImage::Placeholder => "/covers/placeholder".to_string(),
        }
    }
}

/// What the metadata provider said about a book's cover.
enum Fetched {
    Image(Vec<u8>),
    NoImage,
}

/// On-disk cover store keyed by book id, filled lazily from the metadata provider.
///
/// Entries are never invalidated. Concurrent first views of the same book may both
/// download and write; each write lands in a private temp file that is renamed over
/// `{book_id}.png`, so the last writer wins and readers never see a partial file.
#[derive(Clone)]
pub struct CoverCache {
    dir: PathBuf,
    books: BooksApi,
    placeholder: Arc<Vec<u8>>,
}

impl CoverCache {
    pub fn new(dir: impl Into<PathBuf>, books: BooksApi, placeholder: Option<&Path>) -> Self {
        Self {
            dir: dir.into(),
            books,
            placeholder: Arc::new(load_placeholder(placeholder)),
        }
    }

    pub fn path_for(&self, book_id: BookId) -> PathBuf {
        self.dir.join(format!("{book_id}.png"))
    }

    pub fn placeholder_bytes(&self) -> &[u8] {
        &self.placeholder
    }

    /// Resolve a book's cover, fetching it on a cache miss. Provider failures degrade to
    /// the placeholder without caching it, so a later view tries again.
    pub async fn resolve(&self, book_id: BookId, isbn: &str) -> CoverImage {
        let path = self.path_for(book_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return CoverImage::Cached { book_id, path };
        }

        let bytes = match self.fetch(isbn).await {
            Ok(Fetched::Image(bytes)) => bytes,
            Ok(Fetched::NoImage) => {
                info!(book_id, isbn, "provider has no cover; caching placeholder");
                self.placeholder.to_vec()
            }
            Err(e) => {
                warn!(book_id, isbn, error = %e, "cover fetch failed; serving placeholder");
                return CoverImage::Placeholder;
            }
        };

        match self.persist(&path, &bytes).await {
            Ok(()) => {
                debug!(book_id, path = %path.display(), "cover cached");
                CoverImage::Cached { book_id, path }
            }
            Err(e) => {
                warn!(book_id, path = %path.display(), error = %e, "failed to write cover");
                CoverImage::Placeholder
            }
        }
    }

    /// Cached bytes for a book, if present. Never fetches.
    pub async fn read(&self, book_id: BookId) -> Result<Option<Vec<u8>>, LibrisError> {
        match tokio::fs::read(self.path_for(book_id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, isbn: &str) -> Result<Fetched, LibrisError> {
        let volumes = self.books.lookup_isbn(isbn).await?;
        let Some(link) = volumes.thumbnail_link() else {
            return Ok(Fetched::NoImage);
        };
        let bytes = self.books.download(link).await?;
        if bytes.is_empty() {
            return Ok(Fetched::NoImage);
        }
        Ok(Fetched::Image(bytes))
    }

    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<(), LibrisError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("cover"),
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Content type of a cached cover, read from its leading bytes. Covers are stored as
/// `{book_id}.png` whatever the provider actually sent.
pub fn image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => "image/png",
        [0xff, 0xd8, 0xff, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

fn load_placeholder(path: Option<&Path>) -> Vec<u8> {
    if let Some(path) = path {
        match std::fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => return bytes,
            Ok(_) => warn!(path = %path.display(), "placeholder cover is empty; using built-in"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "placeholder cover unreadable; using built-in")
            }
        }
    }
    base64::engine::general_purpose::STANDARD
        .decode(BUILTIN_PLACEHOLDER_PNG)
        .unwrap_or_default()
}
