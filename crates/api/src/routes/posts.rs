//! Post handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use quillpost_core::{CategoryId, PostId, UserId};

use super::extract::{Json, Path, Query};
use super::{Message, missing, page_request, required_text};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, require_owner_or_superadmin};
use crate::models::{NewPost, Post, PostChanges, PostDetail, PostFilter, SortOrder};
use crate::state::AppState;

/// Longest accepted post title.
pub const MAX_TITLE_LENGTH: usize = 255;
/// Longest accepted post body.
pub const MAX_DESCRIPTION_LENGTH: usize = 50_000;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub search: Option<String>,
    pub user_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
    pub sort_by_date: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostDetail>,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

impl PostRequest {
    fn validated(self) -> Result<PostChanges> {
        Ok(PostChanges {
            title: required_text("title", &self.title, MAX_TITLE_LENGTH)?,
            description: required_text("description", &self.description, MAX_DESCRIPTION_LENGTH)?,
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            category_id: self.category_id,
        })
    }
}

async fn with_like_info(state: &AppState, post: Post) -> Result<PostDetail> {
    let like_info = state.store().likes.counts(post.id).await?;
    Ok(PostDetail { post, like_info })
}

/// `GET /v1/posts/{id}`
///
/// Counts as a view.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<Json<PostDetail>> {
    let post = state
        .store()
        .posts
        .record_view(id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    Ok(Json(with_like_info(&state, post).await?))
}

/// `GET /v1/posts`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostsResponse>> {
    let filter = PostFilter {
        page: page_request(query.limit, query.page)?,
        search: query.search.filter(|s| !s.trim().is_empty()),
        user_id: query.user_id,
        category_id: query.category_id,
        sort_by_date: query.sort_by_date.unwrap_or_default(),
    };
    let page = state.store().posts.list(&filter).await?;

    let mut posts = Vec::with_capacity(page.items.len());
    for post in page.items {
        posts.push(with_like_info(&state, post).await?);
    }

    Ok(Json(PostsResponse {
        posts,
        count: page.count,
    }))
}

/// `POST /v1/posts`
///
/// The author is always the caller.
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<PostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let fields = req.validated()?;
    let new_post = NewPost {
        title: fields.title,
        description: fields.description,
        image_url: fields.image_url,
        user_id: caller.id(),
        category_id: fields.category_id,
    };

    let post = state.store().posts.create(&new_post).await?;
    tracing::info!(post_id = %post.id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// `PUT /v1/posts/{id}`
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<PostId>,
    Json(req): Json<PostRequest>,
) -> Result<Json<Post>> {
    let changes = req.validated()?;
    let existing = state
        .store()
        .posts
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    require_owner_or_superadmin(&caller, existing.user_id)?;

    let post = state
        .store()
        .posts
        .update(id, &changes)
        .await
        .map_err(missing("post"))?;
    Ok(Json(post))
}

/// `DELETE /v1/posts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<PostId>,
) -> Result<Json<Message>> {
    let existing = state
        .store()
        .posts
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    require_owner_or_superadmin(&caller, existing.user_id)?;

    state
        .store()
        .posts
        .delete(id)
        .await
        .map_err(missing("post"))?;
    Ok(Json(Message::DELETED))
}
