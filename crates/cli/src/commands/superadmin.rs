//! Superadmin bootstrap.
//!
//! Self-service registration only creates `owner` and `guest` accounts, and
//! only a superadmin may create users through the API, so the first
//! superadmin has to come from here.
//!
//! # Usage
//!
//! ```bash
//! SUPERADMIN_PASSWORD=... qp-cli superadmin create \
//!     -e admin@example.com -f Ada -l Lovelace --dob 1990-12-10
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use quillpost_api::db::{PgUserStore, RepositoryError, UserStore, create_pool};
use quillpost_api::models::NewUser;
use quillpost_api::services::auth::{AuthError, hash_password, validate_name, validate_password};
use quillpost_core::{Email, EmailError, UserId, UserType};

use super::{CommandError, database_url};

/// Errors that can occur creating a superadmin.
#[derive(Debug, Error)]
pub enum SuperadminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    Invalid(#[from] AuthError),

    #[error("User already exists with email: {0}")]
    UserExists(Email),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Arguments for `superadmin create`.
pub struct NewSuperadmin {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub password: String,
}

/// Validate the input into a ready-to-insert user.
///
/// # Errors
///
/// Returns `SuperadminError` for a bad email, name, or password.
pub fn prepare(input: NewSuperadmin) -> Result<NewUser, SuperadminError> {
    let email = Email::parse(&input.email)?;
    validate_name("first_name", &input.first_name)?;
    validate_name("last_name", &input.last_name)?;
    validate_password(&input.password)?;

    Ok(NewUser {
        first_name: input.first_name.trim().to_owned(),
        last_name: input.last_name.trim().to_owned(),
        dob: input.dob,
        email,
        phone_number: None,
        gender: None,
        password_hash: hash_password(&input.password)?,
        profile_image_url: None,
        address: None,
        user_type: UserType::SuperAdmin,
    })
}

/// Create a superadmin account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `SuperadminError::UserExists` if the email is taken.
pub async fn create(input: NewSuperadmin) -> Result<UserId, SuperadminError> {
    let new_user = prepare(input)?;

    let url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await.map_err(CommandError::from)?;
    let users = PgUserStore::new(pool);

    tracing::info!("Creating superadmin: {}", new_user.email);
    let user = users.create(&new_user).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => SuperadminError::UserExists(new_user.email.clone()),
        other => SuperadminError::Repository(other),
    })?;

    tracing::info!(
        "Superadmin created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quillpost_api::services::auth::verify_password;

    use super::*;

    fn input() -> NewSuperadmin {
        NewSuperadmin {
            email: "root@example.com".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            dob: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            password: "r00t-pass".to_owned(),
        }
    }

    #[test]
    fn test_prepare_hashes_and_sets_type() {
        let user = prepare(input()).unwrap();
        assert_eq!(user.user_type, UserType::SuperAdmin);
        assert_ne!(user.password_hash, "r00t-pass");
        assert!(verify_password("r00t-pass", &user.password_hash).is_ok());
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        let mut bad_email = input();
        bad_email.email = "not-an-email".to_owned();
        assert!(matches!(
            prepare(bad_email),
            Err(SuperadminError::InvalidEmail(_))
        ));

        let mut short_password = input();
        short_password.password = "123".to_owned();
        assert!(matches!(
            prepare(short_password),
            Err(SuperadminError::Invalid(_))
        ));
    }
}
