//! Comment domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use quillpost_core::{CommentId, Email, PageRequest, PostId, UserId};

/// A comment on a post.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The public bits of a comment's author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub profile_image_url: Option<String>,
}

/// A comment as it appears in listings.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: CommentAuthor,
}

/// A comment that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub description: String,
}

/// Filter for listing comments, newest first.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub page: PageRequest,
    pub post_id: Option<PostId>,
    pub user_id: Option<UserId>,
}
