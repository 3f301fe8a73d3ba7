use crate::db::models::{
    BookId, DbBook, DbRatingStats, DbReview, DbUser, DbUserReview, ReviewId, ReviewInsert, UserId,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::LibrisError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

const SEARCH_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct LibraryStorage {
    pool: SqlitePool,
}

impl LibraryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, LibrisError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every in-memory connection is its own database; pin the pool to one.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(connect_opts)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(connect_opts).await?
        };
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), LibrisError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- users ----

    pub async fn get_user(&self, user_id: UserId) -> Result<Option<DbUser>, LibrisError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT user_id, username, hash_password FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_name(&self, username: &str) -> Result<Option<DbUser>, LibrisError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT user_id, username, hash_password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user unless the username is taken. Returns `None` when it already exists.
    pub async fn insert_user_if_absent(
        &self,
        username: &str,
        hash_password: &str,
    ) -> Result<Option<UserId>, LibrisError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<UserId> =
            sqlx::query_scalar("SELECT user_id FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            tx.rollback().await?;
            return Ok(None);
        }

        let id = sqlx::query("INSERT INTO users (username, hash_password) VALUES (?, ?)")
            .bind(username)
            .bind(hash_password)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        tx.commit().await?;
        debug!(user_id = id, username, "user inserted");
        Ok(Some(id))
    }

    pub async fn count_users(&self) -> Result<i64, LibrisError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    // ---- books ----

    pub async fn insert_book(
        &self,
        isbn: &str,
        title: &str,
        author: &str,
        year: i64,
    ) -> Result<BookId, LibrisError> {
        let id = sqlx::query("INSERT INTO books (isbn, title, author, year) VALUES (?, ?, ?, ?)")
            .bind(isbn)
            .bind(title)
            .bind(author)
            .bind(year)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn get_book(&self, book_id: BookId) -> Result<Option<DbBook>, LibrisError> {
        let book = sqlx::query_as::<_, DbBook>(
            "SELECT book_id, isbn, title, author, year FROM books WHERE book_id = ?",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    pub async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<DbBook>, LibrisError> {
        let book = sqlx::query_as::<_, DbBook>(
            "SELECT book_id, isbn, title, author, year FROM books WHERE isbn = ? ORDER BY book_id LIMIT 1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Case-insensitive substring match on isbn, title or author.
    pub async fn search_books(&self, query: &str) -> Result<Vec<DbBook>, LibrisError> {
        let pattern = format!("%{}%", escape_like(query));
        let books = sqlx::query_as::<_, DbBook>(
            r#"SELECT book_id, isbn, title, author, year FROM books
               WHERE isbn LIKE ?1 ESCAPE '\' OR title LIKE ?1 ESCAPE '\' OR author LIKE ?1 ESCAPE '\'
               ORDER BY title, book_id
               LIMIT ?2"#,
        )
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    // ---- reviews ----

    pub async fn rating_stats(&self, book_id: BookId) -> Result<DbRatingStats, LibrisError> {
        let stats = sqlx::query_as::<_, DbRatingStats>(
            r#"SELECT COUNT(rev_id) AS review_count, AVG(rating) AS average_rating
               FROM reviews WHERE book_id = ?"#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Review ids for a book, newest first.
    pub async fn review_ids_for_book(&self, book_id: BookId) -> Result<Vec<ReviewId>, LibrisError> {
        let ids = sqlx::query_scalar(
            "SELECT rev_id FROM reviews WHERE book_id = ? ORDER BY rev_data DESC, rev_id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn review_with_author(
        &self,
        rev_id: ReviewId,
    ) -> Result<Option<DbReview>, LibrisError> {
        let review = sqlx::query_as::<_, DbReview>(
            r#"SELECT r.rev_id, r.user_id, u.username, r.book_id, r.rev_data, r.review, r.rating
               FROM reviews r JOIN users u ON u.user_id = r.user_id
               WHERE r.rev_id = ?"#,
        )
        .bind(rev_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    /// Lookup-before-insert within one transaction: an existing review for the
    /// (user, book) pair is kept untouched.
    pub async fn insert_review_once(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: i64,
        review: &str,
        at: DateTime<Utc>,
    ) -> Result<ReviewInsert, LibrisError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<ReviewId> =
            sqlx::query_scalar("SELECT rev_id FROM reviews WHERE user_id = ? AND book_id = ?")
                .bind(user_id)
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?;
        if let Some(id) = existing {
            tx.rollback().await?;
            return Ok(ReviewInsert::AlreadyReviewed(id));
        }

        let id = sqlx::query(
            r#"INSERT INTO reviews (user_id, book_id, rev_data, review, rating)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(at)
        .bind(review)
        .bind(rating)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        tx.commit().await?;
        Ok(ReviewInsert::Created(id))
    }

    pub async fn reviews_by_user(&self, user_id: UserId) -> Result<Vec<DbUserReview>, LibrisError> {
        let rows = sqlx::query_as::<_, DbUserReview>(
            r#"SELECT r.rev_id, r.book_id, b.title, r.rev_data, r.review, r.rating
               FROM reviews r JOIN books b ON b.book_id = r.book_id
               WHERE r.user_id = ?
               ORDER BY r.rev_data DESC, r.rev_id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
