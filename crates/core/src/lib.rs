//! Quillpost Core - Shared types library.
//!
//! This crate provides common types used across all Quillpost components:
//! - `api` - The `/v1` HTTP/JSON backend
//! - `cli` - Command-line tools for migrations and bootstrapping
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds sqlx encoding
//! so the same types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, account roles, and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
