//! Like/dislike handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use quillpost_core::PostId;

use super::extract::{Json, Query};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Like, LikeOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub post_id: PostId,
    /// `true` for like, `false` for dislike.
    pub status: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserPostQuery {
    pub post_id: PostId,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub message: &'static str,
    pub outcome: LikeOutcome,
}

/// `POST /v1/likes`
///
/// No reaction yet creates one, the same reaction again removes it, the
/// opposite reaction flips it.
pub async fn toggle(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<LikeRequest>,
) -> Result<Json<ToggleResponse>> {
    let outcome = state
        .store()
        .likes
        .toggle(req.post_id, caller.id(), req.status)
        .await?;

    tracing::debug!(post_id = %req.post_id, status = req.status, ?outcome, "Reaction toggled");
    Ok(Json(ToggleResponse {
        message: "Successfully finished",
        outcome,
    }))
}

/// `GET /v1/likes/user-post?post_id=`
pub async fn get_for_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<UserPostQuery>,
) -> Result<Json<Like>> {
    let like = state
        .store()
        .likes
        .get(query.post_id, caller.id())
        .await?
        .ok_or_else(|| AppError::not_found("like"))?;
    Ok(Json(like))
}
