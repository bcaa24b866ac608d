//! Authentication extractor and role checks.
//!
//! Handlers that need a caller take a [`CurrentUser`] argument; the request
//! is rejected with 401 before the handler body runs if the token is missing,
//! forged, or expired.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use quillpost_core::{Email, UserId, UserType};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Claims;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// Accepts `Authorization: Bearer <token>` as well as a bare token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.0.sub
    }

    #[must_use]
    pub const fn user_type(&self) -> UserType {
        self.0.user_type
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.0.email
    }

    #[must_use]
    pub const fn is_superadmin(&self) -> bool {
        self.0.user_type.is_superadmin()
    }

    /// Whether the caller may act on something owned by `owner`.
    #[must_use]
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.id() == owner || self.is_superadmin()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("authorization header required".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .unwrap_or(header);

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized(e.to_string())
        })?;

        Span::current().record("user_id", claims.sub.as_i64());
        set_sentry_user(&claims.sub, Some(claims.email.as_str()));

        parts.extensions.insert(claims.clone());
        Ok(Self(claims))
    }
}

/// Reject callers that are not super-admins.
///
/// # Errors
///
/// Returns `AppError::Forbidden`.
pub fn require_superadmin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_superadmin() {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// Reject callers that are neither `owner` nor a super-admin.
///
/// # Errors
///
/// Returns `AppError::Forbidden`.
pub fn require_owner_or_superadmin(user: &CurrentUser, owner: UserId) -> Result<(), AppError> {
    if user.can_manage(owner) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(id: i64, user_type: UserType) -> CurrentUser {
        CurrentUser(Claims {
            sub: UserId::new(id),
            user_type,
            email: Email::parse("caller@example.com").unwrap(),
            iat: 0,
            exp: i64::MAX,
        })
    }

    #[test]
    fn test_require_superadmin() {
        assert!(require_superadmin(&user(1, UserType::SuperAdmin)).is_ok());
        assert!(require_superadmin(&user(1, UserType::Owner)).is_err());
        assert!(require_superadmin(&user(1, UserType::Guest)).is_err());
    }

    #[test]
    fn test_require_owner_or_superadmin() {
        let owner = UserId::new(5);
        assert!(require_owner_or_superadmin(&user(5, UserType::Guest), owner).is_ok());
        assert!(require_owner_or_superadmin(&user(6, UserType::Owner), owner).is_err());
        assert!(require_owner_or_superadmin(&user(1, UserType::SuperAdmin), owner).is_ok());
    }
}
