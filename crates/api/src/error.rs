//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Every error leaves the API as `{"error": "<reason>"}`.

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("{0}")]
    Database(#[from] RepositoryError),

    /// Registration, login, or password recovery failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid access token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// The generic 403 used by ownership and role checks.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Forbidden("forbidden".to_owned())
    }

    /// The generic 404 for a missing entity.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::WrongCredentials
                | AuthError::RegistrationNotFound
                | AuthError::CodeExpired
                | AuthError::IncorrectCode => StatusCode::FORBIDDEN,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(inner) => repository_status(inner),
                AuthError::CorruptPending(_)
                | AuthError::PasswordHash
                | AuthError::Token(_)
                | AuthError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reason shown to the client. Server errors are never described.
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            return "internal server error".to_owned();
        }
        match self {
            Self::Database(RepositoryError::NotFound)
            | Self::Auth(AuthError::Repository(RepositoryError::NotFound)) => "not found".to_owned(),
            Self::Database(RepositoryError::InvalidReference(constraint))
            | Self::Auth(AuthError::Repository(RepositoryError::InvalidReference(constraint))) => {
                invalid_reference_message(constraint)
            }
            Self::Database(RepositoryError::Conflict(reason))
            | Self::Auth(AuthError::Repository(RepositoryError::Conflict(reason))) => {
                reason.clone()
            }
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::InvalidReference(_) => StatusCode::BAD_REQUEST,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Client wording for a foreign-key violation, keyed by constraint name.
fn invalid_reference_message(constraint: &str) -> String {
    let target = if constraint.contains("category") {
        "category"
    } else if constraint.contains("post") && !constraint.starts_with("posts_") {
        "post"
    } else if constraint.contains("user") {
        "user"
    } else {
        "referenced entity"
    };
    format!("{target} does not exist")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.public_message(status);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::cache::CacheError;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::not_found("post").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized("missing token".to_owned()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::BadRequest("test".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("test".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        let status = |e: AuthError| AppError::from(e).status();

        assert_eq!(status(AuthError::Validation("x".to_owned())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::WrongCredentials), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::RegistrationNotFound), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::CodeExpired), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::IncorrectCode), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AuthError::PasswordHash),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AuthError::Cache(CacheError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_status_codes() {
        assert_eq!(
            AppError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("email already exists".to_owned())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RepositoryError::InvalidReference(
                "posts_category_id_fkey".to_owned()
            ))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad type".to_owned())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_of(AuthError::IncorrectCode.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "incorrect verification code" }));
    }

    #[tokio::test]
    async fn test_server_error_details_hidden() {
        let (status, body) =
            body_of(RepositoryError::DataCorruption("users.user_type = 'x'".to_owned()).into())
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal server error" }));
    }

    #[test]
    fn test_invalid_reference_message() {
        assert_eq!(
            invalid_reference_message("posts_category_id_fkey"),
            "category does not exist"
        );
        assert_eq!(
            invalid_reference_message("comments_post_id_fkey"),
            "post does not exist"
        );
        assert_eq!(
            invalid_reference_message("likes_user_id_fkey"),
            "user does not exist"
        );
        assert_eq!(
            invalid_reference_message("posts_user_id_fkey"),
            "user does not exist"
        );
    }
}
