//! Post storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use quillpost_core::{CategoryId, PostId, UserId};

use super::{Page, RepositoryError, like_pattern, sql_offset};
use crate::models::{NewPost, Post, PostChanges, PostFilter};

/// Durable post storage.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Returns `RepositoryError::InvalidReference` if the author or category is missing.
    async fn create(&self, post: &NewPost) -> Result<Post, RepositoryError>;

    /// Read a post without touching its view counter.
    async fn get(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    /// Read a post for display, incrementing its view counter.
    async fn record_view(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepositoryError>;

    async fn update(&self, id: PostId, changes: &PostChanges) -> Result<Post, RepositoryError>;

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError>;
}

const POST_COLUMNS: &str =
    "id, title, description, image_url, user_id, category_id, created_at, updated_at, views_count";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    description: String,
    image_url: Option<String>,
    user_id: i64,
    category_id: i64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    views_count: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::new(row.id),
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            user_id: UserId::new(row.user_id),
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
            views_count: row.views_count,
        }
    }
}

/// `PostgreSQL` post storage.
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");
    if let Some(search) = filter.search.as_deref() {
        builder
            .push(" AND title ILIKE ")
            .push_bind(like_pattern(search));
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let sql = format!(
            "INSERT INTO posts (title, description, image_url, user_id, category_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&post.title)
            .bind(&post.description)
            .bind(&post.image_url)
            .bind(post.user_id)
            .bind(post.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "post already exists"))?;

        Ok(row.into())
    }

    async fn get(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn record_view(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let sql = format!(
            "UPDATE posts SET views_count = views_count + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filters(&mut count, filter);
        let count: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_filters(&mut query, filter);
        let order = filter.sort_by_date.as_sql();
        query
            .push(format!(" ORDER BY created_at {order}, id {order} LIMIT "))
            .push_bind(i64::from(filter.page.limit()))
            .push(" OFFSET ")
            .push_bind(sql_offset(filter.page.offset()));

        let items = query
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Post::from)
            .collect();

        Ok(Page { items, count })
    }

    async fn update(&self, id: PostId, changes: &PostChanges) -> Result<Post, RepositoryError> {
        let sql = format!(
            "UPDATE posts SET title = $1, description = $2, image_url = $3, category_id = $4, \
             updated_at = NOW() \
             WHERE id = $5 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.image_url)
            .bind(changes.category_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "post already exists"))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
