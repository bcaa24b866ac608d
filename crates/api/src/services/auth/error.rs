//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::cache::CacheError;
use crate::db::RepositoryError;

/// Errors that can occur during registration, login, and password recovery.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request failed a shape check.
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("wrong email or password")]
    WrongCredentials,

    /// A confirmed account already uses this email.
    #[error("email already exists")]
    EmailTaken,

    /// No confirmed account has this email.
    #[error("user not found")]
    UserNotFound,

    /// No staged registration for this email (never started, or expired).
    #[error("registration not found or expired")]
    RegistrationNotFound,

    /// The one-time code is gone (expired or already used).
    #[error("verification code has been expired")]
    CodeExpired,

    /// The one-time code does not match.
    #[error("incorrect verification code")]
    IncorrectCode,

    /// Staged registration payload could not be read back.
    #[error("corrupt pending registration: {0}")]
    CorruptPending(#[from] serde_json::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Cache backend error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
