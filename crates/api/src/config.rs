//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `AUTH_SECRET_KEY` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `HTTP_PORT` - Listen port (default: 8000)
//! - `REDIS_URL` - Redis connection string; without it an in-process cache is used
//! - `SMTP_HOST` - SMTP relay (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_SENDER` / `SMTP_PASSWORD` - SMTP login; without both, emails are only logged
//! - `MEDIA_DIR` - Directory for uploaded files (default: media)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Shortest accepted `AUTH_SECRET_KEY`.
const MIN_AUTH_SECRET_LENGTH: usize = 32;

/// Lowest accepted Shannon entropy of `AUTH_SECRET_KEY`, in bits per character.
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a copied-in sample value rather than a real key.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("AUTH_SECRET_KEY rejected: {0}")]
    WeakSecret(String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Redis URL for the ephemeral cache
    pub redis_url: Option<SecretString>,
    /// HMAC key for access tokens
    pub auth_secret: SecretString,
    /// Outgoing mail settings, absent when SMTP is not configured
    pub smtp: Option<SmtpConfig>,
    /// Where uploaded files are written and served from
    pub media_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Login and `From` address
    pub sender: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let auth_secret = required("AUTH_SECRET_KEY")?;
        check_auth_secret(&auth_secret).map_err(ConfigError::WeakSecret)?;

        Ok(Self {
            database_url: SecretString::from(required("DATABASE_URL")?),
            host: parsed_or("API_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed_or("HTTP_PORT", 8000)?,
            redis_url: optional("REDIS_URL").map(SecretString::from),
            auth_secret: SecretString::from(auth_secret),
            smtp: SmtpConfig::from_env()?,
            media_dir: optional("MEDIA_DIR").map_or_else(|| PathBuf::from("media"), PathBuf::from),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    /// `None` unless both the sender and the password are set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(sender), Some(password)) = (optional("SMTP_SENDER"), optional("SMTP_PASSWORD"))
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            host: optional("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_owned()),
            port: parsed_or("SMTP_PORT", 587)?,
            sender,
            password: SecretString::from(password),
        }))
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

/// Empty values count as unset.
fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(var).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })
    })
}

/// Reject short, sample, or low-entropy signing keys.
fn check_auth_secret(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_AUTH_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_AUTH_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy {entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}; generate a random key"
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}
