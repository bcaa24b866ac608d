//! Like/dislike storage.

use async_trait::async_trait;
use sqlx::PgPool;

use quillpost_core::{LikeId, PostId, UserId};

use super::RepositoryError;
use crate::models::{Like, LikeInfo, LikeOutcome};

/// Durable reaction storage.
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Apply a like (`status = true`) or dislike (`false`) from `user_id`.
    ///
    /// No reaction yet creates one, the same reaction again removes it, and
    /// the opposite reaction flips it in place.
    async fn toggle(
        &self,
        post_id: PostId,
        user_id: UserId,
        status: bool,
    ) -> Result<LikeOutcome, RepositoryError>;

    async fn get(&self, post_id: PostId, user_id: UserId)
    -> Result<Option<Like>, RepositoryError>;

    async fn counts(&self, post_id: PostId) -> Result<LikeInfo, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    status: bool,
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Self {
            id: LikeId::new(row.id),
            post_id: PostId::new(row.post_id),
            user_id: UserId::new(row.user_id),
            status: row.status,
        }
    }
}

/// `PostgreSQL` reaction storage.
pub struct PgLikeStore {
    pool: PgPool,
}

impl PgLikeStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeStore for PgLikeStore {
    async fn toggle(
        &self,
        post_id: PostId,
        user_id: UserId,
        status: bool,
    ) -> Result<LikeOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64, bool)> = sqlx::query_as(
            "SELECT id, status FROM likes WHERE post_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = LikeOutcome::decide(existing.map(|(_, current)| current), status);
        match (outcome, existing) {
            (LikeOutcome::Created, _) => {
                sqlx::query("INSERT INTO likes (post_id, user_id, status) VALUES ($1, $2, $3)")
                    .bind(post_id)
                    .bind(user_id)
                    .bind(status)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepositoryError::from_write(e, "like already exists"))?;
            }
            (LikeOutcome::Removed, Some((id, _))) => {
                sqlx::query("DELETE FROM likes WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            (LikeOutcome::Updated, Some((id, _))) => {
                sqlx::query("UPDATE likes SET status = $1 WHERE id = $2")
                    .bind(status)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            (LikeOutcome::Removed | LikeOutcome::Updated, None) => {
                return Err(RepositoryError::NotFound);
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn get(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<Option<Like>, RepositoryError> {
        let row = sqlx::query_as::<_, LikeRow>(
            "SELECT id, post_id, user_id, status FROM likes WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Like::from))
    }

    async fn counts(&self, post_id: PostId) -> Result<LikeInfo, RepositoryError> {
        let (likes_count, dislikes_count): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE status), COUNT(*) FILTER (WHERE NOT status) \
             FROM likes WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LikeInfo {
            likes_count,
            dislikes_count,
        })
    }
}
