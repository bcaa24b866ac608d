//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span, echoed in the response)
//!
//! Authentication is an extractor ([`CurrentUser`]) rather than a layer, so
//! public and protected routes can share a path.

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, require_owner_or_superadmin, require_superadmin};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
