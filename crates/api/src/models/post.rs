//! Post domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quillpost_core::{CategoryId, PageRequest, PostId, UserId};

use super::like::LikeInfo;

/// A published post.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub views_count: i64,
}

/// A post together with its reaction counts, returned by single-post reads.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub like_info: LikeInfo,
}

/// A post that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub user_id: UserId,
    pub category_id: CategoryId,
}

/// Editable post fields. The author never changes.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Creation-date ordering for post listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub page: PageRequest,
    /// Case-insensitive substring over the title.
    pub search: Option<String>,
    pub user_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
    pub sort_by_date: SortOrder,
}
