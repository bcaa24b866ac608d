//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Two-phase registration, login, password recovery, access tokens
//! - `email` - One-time code emails (SMTP or log-only)

pub mod auth;
pub mod email;
