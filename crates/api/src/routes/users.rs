//! User profile handlers.

use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use quillpost_core::{Email, Gender, UserId, UserType};

use super::extract::{Json, Path, Query};
use super::{Message, missing, page_request};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, require_owner_or_superadmin, require_superadmin};
use crate::models::{NewUser, User, UserChanges, UserFilter};
use crate::services::auth::{hash_password, validate_name, validate_password};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub password: String,
    pub profile_image_url: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub profile_image_url: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// `GET /v1/users/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<User>> {
    let user = state
        .store()
        .users
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user))
}

/// `GET /v1/users/me`
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> Result<Json<User>> {
    let profile = state
        .store()
        .users
        .get(user.id())
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(profile))
}

/// `GET /v1/users`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersResponse>> {
    let filter = UserFilter {
        page: page_request(query.limit, query.page)?,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let page = state.store().users.list(&filter).await?;

    Ok(Json(UsersResponse {
        users: page.items,
        count: page.count,
    }))
}

/// `POST /v1/users`
///
/// Superadmin only. Unlike self-service registration, any type (including
/// `superadmin`) may be created, and no code is emailed.
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    require_superadmin(&caller)?;
    validate_name("first_name", &req.first_name)?;
    validate_name("last_name", &req.last_name)?;
    validate_password(&req.password)?;

    let new_user = NewUser {
        first_name: req.first_name.trim().to_owned(),
        last_name: req.last_name.trim().to_owned(),
        dob: req.dob,
        email: req.email,
        phone_number: req.phone_number,
        gender: req.gender,
        password_hash: hash_password(&req.password)?,
        profile_image_url: req.profile_image_url,
        address: req.address,
        user_type: req.user_type,
    };

    let user = state.store().users.create(&new_user).await?;
    tracing::info!(user_id = %user.id, user_type = %user.user_type, "User created by superadmin");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /v1/users/{id}`
///
/// Self or superadmin. Only a superadmin may change an account's type; the
/// password is changed through `/v1/auth/update-password` instead.
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    require_owner_or_superadmin(&caller, id)?;
    validate_name("first_name", &req.first_name)?;
    validate_name("last_name", &req.last_name)?;

    let existing = state
        .store()
        .users
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    if req.user_type != existing.user_type && !caller.is_superadmin() {
        return Err(AppError::forbidden());
    }

    let changes = UserChanges {
        first_name: req.first_name.trim().to_owned(),
        last_name: req.last_name.trim().to_owned(),
        dob: req.dob,
        email: req.email,
        phone_number: req.phone_number,
        gender: req.gender,
        profile_image_url: req.profile_image_url,
        address: req.address,
        user_type: req.user_type,
    };

    let user = state
        .store()
        .users
        .update(id, &changes)
        .await
        .map_err(missing("user"))?;
    Ok(Json(user))
}

/// `DELETE /v1/users/{id}`
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<Message>> {
    require_owner_or_superadmin(&caller, id)?;

    state
        .store()
        .users
        .delete(id)
        .await
        .map_err(missing("user"))?;

    tracing::info!(user_id = %id, deleted_by = %caller.id(), "User deleted");
    Ok(Json(Message::DELETED))
}
