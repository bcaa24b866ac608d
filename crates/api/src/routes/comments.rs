//! Comment handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use quillpost_core::{CommentId, PostId, UserId};

use super::extract::{Json, Path, Query};
use super::{Message, missing, page_request, required_text};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, require_owner_or_superadmin};
use crate::models::{Comment, CommentFilter, CommentWithAuthor, NewComment};
use crate::state::AppState;

/// Longest accepted comment.
pub const MAX_COMMENT_LENGTH: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub post_id: Option<PostId>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentWithAuthor>,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: PostId,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub description: String,
}

/// `GET /v1/comments`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<CommentsResponse>> {
    let filter = CommentFilter {
        page: page_request(query.limit, query.page)?,
        post_id: query.post_id,
        user_id: query.user_id,
    };
    let page = state.store().comments.list(&filter).await?;

    Ok(Json(CommentsResponse {
        comments: page.items,
        count: page.count,
    }))
}

/// `POST /v1/comments`
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = NewComment {
        post_id: req.post_id,
        user_id: caller.id(),
        description: required_text("description", &req.description, MAX_COMMENT_LENGTH)?,
    };

    let comment = state.store().comments.create(&comment).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// `PUT /v1/comments/{id}`
///
/// Only the author may edit, superadmins included.
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<CommentId>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>> {
    let description = required_text("description", &req.description, MAX_COMMENT_LENGTH)?;
    let existing = state
        .store()
        .comments
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("comment"))?;
    if existing.user_id != caller.id() {
        return Err(AppError::forbidden());
    }

    let comment = state
        .store()
        .comments
        .update(id, &description)
        .await
        .map_err(missing("comment"))?;
    Ok(Json(comment))
}

/// `DELETE /v1/comments/{id}`
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<CommentId>,
) -> Result<Json<Message>> {
    let existing = state
        .store()
        .comments
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("comment"))?;
    require_owner_or_superadmin(&caller, existing.user_id)?;

    state
        .store()
        .comments
        .delete(id)
        .await
        .map_err(missing("comment"))?;
    Ok(Json(Message::DELETED))
}
