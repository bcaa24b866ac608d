//! Durable storage for confirmed accounts and blog content.
//!
//! ## Tables
//!
//! - `users` - Confirmed accounts (created only after code verification or by a superadmin)
//! - `categories` - Post categories
//! - `posts` - Posts, removed together with their category
//! - `comments` - Comments on posts
//! - `likes` - One like/dislike per (post, user)
//!
//! Each entity has a store trait with a `PostgreSQL` adapter and an
//! in-memory adapter ([`memory::MemoryDatabase`]) used by tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p quillpost-cli -- migrate
//! ```

pub mod categories;
pub mod comments;
pub mod likes;
pub mod memory;
pub mod posts;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::{CategoryStore, PgCategoryStore};
pub use comments::{CommentStore, PgCommentStore};
pub use likes::{LikeStore, PgLikeStore};
pub use memory::MemoryDatabase;
pub use posts::{PgPostStore, PostStore};
pub use users::{PgUserStore, UserStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row (post, category, user) does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl RepositoryError {
    /// Classify a write error, mapping constraint violations to domain errors.
    pub(crate) fn from_write(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(
                    db_err.constraint().unwrap_or("foreign key").to_owned(),
                );
            }
        }
        Self::Database(e)
    }
}

/// One page of a listing plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: i64,
}

impl<T> Page<T> {
    /// Map the items, keeping the count.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
        }
    }
}

/// Handles to every entity store.
///
/// Cheap to clone; handlers reach it through `AppState`.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    pub likes: Arc<dyn LikeStore>,
    pool: Option<PgPool>,
}

impl Store {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            categories: Arc::new(PgCategoryStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool.clone())),
            likes: Arc::new(PgLikeStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Stores backed by a single shared in-memory database.
    #[must_use]
    pub fn memory() -> Self {
        let db = Arc::new(MemoryDatabase::default());
        Self {
            users: db.clone(),
            categories: db.clone(),
            posts: db.clone(),
            comments: db.clone(),
            likes: db,
            pool: None,
        }
    }

    /// Check that the backing database answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the ping query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `LIKE` metacharacters and wrap for a substring match.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Clamp a `u64` row offset into the `BIGINT` range.
pub(crate) fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}
