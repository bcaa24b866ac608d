//! Core types for Quillpost.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pagination;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{PageRequest, PaginationError};
pub use role::{Gender, ParseRoleError, UserType};
