//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use quillpost_core::{Email, Gender, PageRequest, UserId, UserType};

/// A confirmed account (domain type).
///
/// Serializes to the public profile shape; the password hash never leaves
/// the process.
#[derive(Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    #[serde(skip)]
    pub password_hash: String,
    pub profile_image_url: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A user that has not been persisted yet.
///
/// Also the pending-registration payload: it is serialized to JSON and
/// parked in the cache until the emailed code is confirmed, so it carries
/// the already-hashed password.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub password_hash: String,
    pub profile_image_url: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub profile_image_url: Option<String>,
    pub address: Option<String>,
    pub user_type: UserType,
}

/// Filter for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub page: PageRequest,
    /// Case-insensitive substring over names, phone number, and email.
    pub search: Option<String>,
}

impl User {
    /// Whether `search` matches this user the way the list query does.
    #[must_use]
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        [
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.phone_number.as_deref(),
            Some(self.email.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
