//! Ephemeral key-value cache with per-key expiry.
//!
//! Holds pending registrations and one-time codes. Nothing here is durable:
//! a restart (or an expired TTL) simply means the user has to ask for a new
//! code.
//!
//! # Keys
//!
//! - `user_<email>` - pending registration payload (JSON)
//! - `register_code_<email>` - signup code
//! - `forgot_password_code_<email>` - password reset code

mod memory;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

/// Errors that can occur talking to the cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis command or connection failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// String key-value store where every entry expires.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry and its TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove an entry. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Key for a staged registration.
#[must_use]
pub fn pending_user_key(email: &str) -> String {
    format!("user_{email}")
}

/// Key for a one-time code of the given purpose.
#[must_use]
pub fn code_key(purpose: CodePurpose, email: &str) -> String {
    format!("{}_{email}", purpose.as_str())
}

/// What a one-time code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    Register,
    ForgotPassword,
}

impl CodePurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register_code",
            Self::ForgotPassword => "forgot_password_code",
        }
    }
}
