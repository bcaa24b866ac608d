//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use quillpost_core::{CategoryId, PageRequest};

/// A post category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub page: PageRequest,
    /// Case-insensitive substring over the title.
    pub search: Option<String>,
}
