//! Category handlers. Reads are public, writes are superadmin only.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use quillpost_core::CategoryId;

use super::extract::{Json, Path, Query};
use super::{Message, missing, page_request, required_text};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, require_superadmin};
use crate::models::{Category, CategoryFilter};
use crate::state::AppState;

/// Longest accepted category title.
pub const MAX_TITLE_LENGTH: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub title: String,
}

/// `GET /v1/categories/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = state
        .store()
        .categories
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("category"))?;
    Ok(Json(category))
}

/// `GET /v1/categories`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<CategoriesResponse>> {
    let filter = CategoryFilter {
        page: page_request(query.limit, query.page)?,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let page = state.store().categories.list(&filter).await?;

    Ok(Json(CategoriesResponse {
        categories: page.items,
        count: page.count,
    }))
}

/// `POST /v1/categories`
pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    require_superadmin(&caller)?;
    let title = required_text("title", &req.title, MAX_TITLE_LENGTH)?;

    let category = state.store().categories.create(&title).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /v1/categories/{id}`
pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<CategoryId>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    require_superadmin(&caller)?;
    let title = required_text("title", &req.title, MAX_TITLE_LENGTH)?;

    let category = state
        .store()
        .categories
        .update(id, &title)
        .await
        .map_err(missing("category"))?;
    Ok(Json(category))
}

/// `DELETE /v1/categories/{id}`
///
/// Posts filed under the category go with it.
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<CategoryId>,
) -> Result<Json<Message>> {
    require_superadmin(&caller)?;

    state
        .store()
        .categories
        .delete(id)
        .await
        .map_err(missing("category"))?;

    tracing::info!(category_id = %id, "Category deleted with its posts");
    Ok(Json(Message::DELETED))
}
