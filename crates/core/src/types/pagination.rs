//! Page window for list endpoints.

use serde::{Deserialize, Serialize};

/// Errors for out-of-range page parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("limit must be between 1 and {max}")]
    Limit { max: u32 },
    #[error("page must be at least 1")]
    Page,
}

/// A 1-based page request.
///
/// ```
/// use quillpost_core::PageRequest;
///
/// let page = PageRequest::new(10, 2).unwrap();
/// assert_eq!(page.offset(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    limit: u32,
    page: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Build a validated page request.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is outside `1..=MAX_LIMIT` or `page` is 0.
    pub const fn new(limit: u32, page: u32) -> Result<Self, PaginationError> {
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(PaginationError::Limit {
                max: Self::MAX_LIMIT,
            });
        }
        if page == 0 {
            return Err(PaginationError::Page);
        }
        Ok(Self { limit, page })
    }

    /// Fill in defaults for absent query parameters, then validate.
    ///
    /// # Errors
    ///
    /// Same as [`PageRequest::new`].
    pub fn from_query(limit: Option<u32>, page: Option<u32>) -> Result<Self, PaginationError> {
        Self::new(
            limit.unwrap_or(Self::DEFAULT_LIMIT),
            page.unwrap_or(1),
        )
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            page: 1,
        }
    }
}
