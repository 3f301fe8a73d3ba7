//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: every parameterized query the application issues

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{BookId, DbBook, DbRatingStats, DbReview, DbUser, ReviewId, ReviewInsert, UserId};
pub use schema::SQLITE_INIT;
pub use sqlite::{LibraryStorage, SqlitePool};
