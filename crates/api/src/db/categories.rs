//! Category storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use quillpost_core::CategoryId;

use super::{Page, RepositoryError, like_pattern, sql_offset};
use crate::models::{Category, CategoryFilter};

/// Durable category storage.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create(&self, title: &str) -> Result<Category, RepositoryError>;

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn list(&self, filter: &CategoryFilter) -> Result<Page<Category>, RepositoryError>;

    async fn update(&self, id: CategoryId, title: &str) -> Result<Category, RepositoryError>;

    /// Delete a category and every post filed under it.
    async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    title: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            title: row.title,
            created_at: row.created_at,
        }
    }
}

/// `PostgreSQL` category storage.
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search {
        builder
            .push(" WHERE title ILIKE ")
            .push_bind(like_pattern(search));
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn create(&self, title: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (title) VALUES ($1) RETURNING id, title, created_at",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, title, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn list(&self, filter: &CategoryFilter) -> Result<Page<Category>, RepositoryError> {
        let search = filter.search.as_deref();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories");
        push_search(&mut count, search);
        let count: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT id, title, created_at FROM categories");
        push_search(&mut query, search);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.page.limit()))
            .push(" OFFSET ")
            .push_bind(sql_offset(filter.page.offset()));

        let items = query
            .build_query_as::<CategoryRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Category::from)
            .collect();

        Ok(Page { items, count })
    }

    async fn update(&self, id: CategoryId, title: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET title = $1 WHERE id = $2 RETURNING id, title, created_at",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let posts = sqlx::query("DELETE FROM posts WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        tracing::debug!(category_id = %id, posts_removed = posts.rows_affected(), "Category deleted");
        Ok(())
    }
}
