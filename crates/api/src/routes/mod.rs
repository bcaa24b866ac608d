//! HTTP route handlers for the `/v1` API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (store ping)
//! GET  /media/{file}                    - Uploaded files
//!
//! # Auth
//! POST /v1/auth/register                - Stage registration, email a code
//! POST /v1/auth/verify                  - Confirm registration with the code
//! POST /v1/auth/login                   - Email + password login
//! POST /v1/auth/forgot-password         - Email a reset code
//! POST /v1/auth/verify-forgot-password  - Exchange reset code for a token
//! POST /v1/auth/update-password         - Set a new password (auth)
//!
//! # Users
//! GET    /v1/users                      - List (search)
//! POST   /v1/users                      - Create (superadmin)
//! GET    /v1/users/me                   - Caller's profile (auth)
//! GET    /v1/users/{id}                 - Profile
//! PUT    /v1/users/{id}                 - Update (self or superadmin)
//! DELETE /v1/users/{id}                 - Delete (self or superadmin)
//!
//! # Categories
//! GET    /v1/categories                 - List (search)
//! POST   /v1/categories                 - Create (superadmin)
//! GET    /v1/categories/{id}            - Read
//! PUT    /v1/categories/{id}            - Rename (superadmin)
//! DELETE /v1/categories/{id}            - Delete with its posts (superadmin)
//!
//! # Posts
//! GET    /v1/posts                      - List (search, filters, sort)
//! POST   /v1/posts                      - Publish (auth)
//! GET    /v1/posts/{id}                 - Read, counting a view
//! PUT    /v1/posts/{id}                 - Edit (author or superadmin)
//! DELETE /v1/posts/{id}                 - Delete (author or superadmin)
//!
//! # Comments
//! GET    /v1/comments                   - List (post/user filters)
//! POST   /v1/comments                   - Comment (auth)
//! PUT    /v1/comments/{id}              - Edit (author)
//! DELETE /v1/comments/{id}              - Delete (author or superadmin)
//!
//! # Likes
//! POST /v1/likes                        - Toggle like/dislike (auth)
//! GET  /v1/likes/user-post?post_id=     - Caller's reaction (auth)
//!
//! # Files
//! POST /v1/file-upload                  - Multipart upload (auth)
//! ```

pub mod auth;
pub mod categories;
pub mod comments;
pub mod extract;
pub mod likes;
pub mod posts;
pub mod uploads;
pub mod users;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use quillpost_core::PageRequest;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Largest accepted request body (uploads included).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the `/v1/auth` router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify", post(auth::verify))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-forgot-password", post(auth::verify_forgot_password))
        .route("/update-password", post(auth::update_password))
}

/// Create the `/v1` router.
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/users", get(users::list).post(users::create))
        .route("/users/me", get(users::me))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/comments", get(comments::list).post(comments::create))
        .route(
            "/comments/{id}",
            axum::routing::put(comments::update).delete(comments::delete),
        )
        .route("/likes", post(likes::toggle))
        .route("/likes/user-post", get(likes::get_for_user))
        .route("/file-upload", post(uploads::upload))
}

/// Build the full application router.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let media = ServeDir::new(state.media_dir());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/v1", v1_routes())
        .nest_service("/media", media)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

// =============================================================================
// Shared response and query helpers
// =============================================================================

/// `{"message": "..."}` acknowledgment body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub const DELETED: Self = Self {
        message: "successfully deleted",
    };
}

/// Turn `limit`/`page` query values into a validated window.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if either value is out of range.
pub fn page_request(limit: Option<u32>, page: Option<u32>) -> Result<PageRequest, AppError> {
    PageRequest::from_query(limit, page).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Map a store `NotFound` to a 404 naming `what`.
pub fn missing(what: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::not_found(what),
        other => AppError::Database(other),
    }
}

/// Trim `value` and check it is non-empty and at most `max` characters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `field`.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}
