use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;

use crate::api::{BooksApi, RatingsApi, build_http_client};
use crate::config::Config;
use crate::db::LibraryStorage;
use crate::error::LibrisError;
use crate::handlers::{auth, books, isbn_api, users};
use crate::middleware::session::session_key;
use crate::service::cover_cache::CoverCache;

/// Request-scoped context handed to every handler.
#[derive(Clone)]
pub struct LibrisState {
    pub storage: LibraryStorage,
    pub covers: CoverCache,
    pub ratings: RatingsApi,
    pub key: Key,
    pub secure_cookie: bool,
}

impl LibrisState {
    pub fn new(storage: LibraryStorage, cfg: &Config) -> Result<Self, LibrisError> {
        let client = build_http_client(cfg)?;
        let books = BooksApi::new(client.clone(), cfg.books_api_url.clone());
        Ok(Self {
            storage,
            covers: CoverCache::new(
                cfg.cover_dir.clone(),
                books,
                cfg.placeholder_cover.as_deref(),
            ),
            ratings: RatingsApi::new(
                client,
                cfg.ratings_api_url.clone(),
                cfg.ratings_api_key.clone(),
            ),
            key: session_key(&cfg.session_secret),
            secure_cookie: !cfg.insecure_cookie,
        })
    }
}

impl FromRef<LibrisState> for Key {
    fn from_ref(state: &LibrisState) -> Self {
        state.key.clone()
    }
}

pub fn libris_router(state: LibrisState) -> Router {
    Router::new()
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/logout", get(auth::logout))
        .route("/", get(books::index))
        .route("/books", get(books::books_redirect))
        .route("/books/{book_id}", get(books::book))
        .route("/submit_review", post(books::submit_review))
        .route("/search", get(books::search))
        .route("/covers/{name}", get(books::cover))
        .route("/users", get(users::users_redirect))
        .route("/users/{user_id}", get(users::user))
        .route("/api/{isbn}", get(isbn_api::book_by_isbn))
        .with_state(state)
}
