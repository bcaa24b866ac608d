//! Comment storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use quillpost_core::{CommentId, Email, PostId, UserId};

use super::{Page, RepositoryError, sql_offset};
use crate::models::{Comment, CommentAuthor, CommentFilter, CommentWithAuthor, NewComment};

/// Durable comment storage.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Returns `RepositoryError::InvalidReference` if the post or author is missing.
    async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError>;

    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;

    /// Newest first, each with its author.
    async fn list(
        &self,
        filter: &CommentFilter,
    ) -> Result<Page<CommentWithAuthor>, RepositoryError>;

    async fn update(&self, id: CommentId, description: &str) -> Result<Comment, RepositoryError>;

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError>;
}

const COMMENT_COLUMNS: &str = "id, post_id, user_id, description, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            post_id: PostId::new(row.post_id),
            user_id: UserId::new(row.user_id),
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentWithAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    first_name: String,
    last_name: String,
    email: String,
    profile_image_url: Option<String>,
}

impl TryFrom<CommentWithAuthorRow> for CommentWithAuthor {
    type Error = RepositoryError;

    fn try_from(row: CommentWithAuthorRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let comment = Comment::from(row.comment);

        Ok(Self {
            user: CommentAuthor {
                id: comment.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email,
                profile_image_url: row.profile_image_url,
            },
            comment,
        })
    }
}

/// `PostgreSQL` comment storage.
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &CommentFilter) {
    builder.push(" WHERE TRUE");
    if let Some(post_id) = filter.post_id {
        builder.push(" AND c.post_id = ").push_bind(post_id);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND c.user_id = ").push_bind(user_id);
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        let sql = format!(
            "INSERT INTO comments (post_id, user_id, description) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.post_id)
            .bind(comment.user_id)
            .bind(&comment.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "comment already exists"))?;

        Ok(row.into())
    }

    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::from))
    }

    async fn list(
        &self,
        filter: &CommentFilter,
    ) -> Result<Page<CommentWithAuthor>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM comments c");
        push_filters(&mut count, filter);
        let count: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT c.id, c.post_id, c.user_id, c.description, c.created_at, c.updated_at, \
             u.first_name, u.last_name, u.email, u.profile_image_url \
             FROM comments c INNER JOIN users u ON u.id = c.user_id",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(i64::from(filter.page.limit()))
            .push(" OFFSET ")
            .push_bind(sql_offset(filter.page.offset()));

        let items = query
            .build_query_as::<CommentWithAuthorRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CommentWithAuthor::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, count })
    }

    async fn update(&self, id: CommentId, description: &str) -> Result<Comment, RepositoryError> {
        let sql = format!(
            "UPDATE comments SET description = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
