//! Authentication service.
//!
//! Two-phase registration, password login, and password recovery.
//!
//! Registration never writes a durable user until the emailed code is
//! confirmed: the candidate account (with its already-hashed password) is
//! parked in the ephemeral cache under `user_<email>` and only moved into
//! the user store by [`AuthService::complete_registration`].
//!
//! Code delivery runs on a detached task. Its failures are logged, never
//! returned; the caller has already been told the code is on its way.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{hash_password, validate_password, verify_password};
pub use token::{Claims, TokenError, TokenIssuer};

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::Instrument;

use quillpost_core::{Email, UserId, UserType};

use crate::cache::{CacheError, CodePurpose, KeyValueCache, code_key, pending_user_key};
use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};
use crate::services::email::{EmailError, Mailer, OutgoingEmail, generate_verification_code};

/// Minimum length of first and last names, in characters.
pub const MIN_NAME_LENGTH: usize = 2;
/// Maximum length of first and last names, in characters.
pub const MAX_NAME_LENGTH: usize = 30;

/// Lifetimes of everything the auth flows create.
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// How long a staged registration waits for confirmation.
    pub pending_ttl: Duration,
    /// How long a one-time code stays valid.
    pub code_ttl: Duration,
    /// Lifetime of tokens issued by login and registration.
    pub session_ttl: chrono::Duration,
    /// Lifetime of tokens issued by password recovery.
    pub reset_ttl: chrono::Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(10 * 60),
            code_ttl: Duration::from_secs(60),
            session_ttl: chrono::Duration::hours(24),
            reset_ttl: chrono::Duration::minutes(30),
        }
    }
}

/// A self-service signup request.
#[derive(Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub password: String,
    pub user_type: UserType,
}

/// An authenticated user and the token that proves it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
}

/// Errors from the detached code-dispatch task.
#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Authentication service.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn KeyValueCache>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
    settings: AuthSettings,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: Arc<dyn KeyValueCache>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenIssuer,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            cache,
            mailer,
            tokens,
            settings,
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub const fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Stage a new account and send a confirmation code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad input, `AuthError::EmailTaken`
    /// if a confirmed account already uses the email (checked before anything
    /// is written to the cache), or a backend error.
    #[tracing::instrument(skip_all, fields(email = %registration.email))]
    pub async fn start_registration(&self, registration: Registration) -> Result<(), AuthError> {
        validate_name("first_name", &registration.first_name)?;
        validate_name("last_name", &registration.last_name)?;
        validate_password(&registration.password)?;
        if !registration.user_type.is_self_registrable() {
            return Err(AuthError::Validation(
                "type must be one of: guest, owner".to_owned(),
            ));
        }

        if self.users.get_by_email(&registration.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let pending = NewUser {
            first_name: registration.first_name.trim().to_owned(),
            last_name: registration.last_name.trim().to_owned(),
            dob: registration.dob,
            email: registration.email,
            phone_number: None,
            gender: None,
            password_hash: hash_password(&registration.password)?,
            profile_image_url: None,
            address: None,
            user_type: registration.user_type,
        };

        let payload = serde_json::to_string(&pending)?;
        self.cache
            .set(
                &pending_user_key(pending.email.as_str()),
                &payload,
                self.settings.pending_ttl,
            )
            .await?;

        self.dispatch_code(CodePurpose::Register, pending.email);
        Ok(())
    }

    /// Confirm a staged registration with its code and persist the account.
    ///
    /// # Errors
    ///
    /// - `AuthError::RegistrationNotFound` if nothing is staged for the email
    /// - `AuthError::CodeExpired` if the code is gone
    /// - `AuthError::IncorrectCode` if the code does not match
    /// - `AuthError::EmailTaken` if the email was claimed in the meantime
    #[tracing::instrument(skip(self, code))]
    pub async fn complete_registration(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<AuthSession, AuthError> {
        let pending_key = pending_user_key(email.as_str());
        let payload = self
            .cache
            .get(&pending_key)
            .await?
            .ok_or(AuthError::RegistrationNotFound)?;
        let pending: NewUser = serde_json::from_str(&payload)?;

        let code_key = self.check_code(CodePurpose::Register, email, code).await?;

        // The code stays valid until the account row exists.
        let user = self.users.create(&pending).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::Repository(other),
        })?;

        for key in [&code_key, &pending_key] {
            if let Err(e) = self.cache.delete(key).await {
                tracing::warn!(error = %e, key = %key, "Failed to clear registration cache entry");
            }
        }

        tracing::info!(user_id = %user.id, "Registration completed");
        self.session(user, self.settings.session_ttl)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCredentials` for an unknown email and for a
    /// wrong password alike.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::WrongCredentials)?;

        verify_password(password, &user.password_hash)?;

        self.session(user, self.settings.session_ttl)
    }

    // =========================================================================
    // Password Recovery
    // =========================================================================

    /// Send a password reset code to a confirmed account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    #[tracing::instrument(skip(self))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), AuthError> {
        if self.users.get_by_email(email).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.dispatch_code(CodePurpose::ForgotPassword, email.clone());
        Ok(())
    }

    /// Exchange a reset code for a short-lived token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CodeExpired` or `AuthError::IncorrectCode` for code
    /// problems, `AuthError::UserNotFound` if the account vanished.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_forgot_password(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<AuthSession, AuthError> {
        self.consume_code(CodePurpose::ForgotPassword, email, code)
            .await?;

        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.session(user, self.settings.reset_ttl)
    }

    /// Replace the password of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a bad password or
    /// `AuthError::UserNotFound` if no row was updated.
    #[tracing::instrument(skip(self, password))]
    pub async fn update_password(&self, user_id: UserId, password: &str) -> Result<(), AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .update_password(user_id, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!("Password updated");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn session(&self, user: User, ttl: chrono::Duration) -> Result<AuthSession, AuthError> {
        let access_token = self
            .tokens
            .issue(user.id, user.user_type, &user.email, ttl)?;
        Ok(AuthSession { user, access_token })
    }

    /// Check a one-time code and invalidate it on a match.
    async fn consume_code(
        &self,
        purpose: CodePurpose,
        email: &Email,
        code: &str,
    ) -> Result<(), AuthError> {
        let key = self.check_code(purpose, email, code).await?;
        self.cache.delete(&key).await?;
        Ok(())
    }

    /// Compare `code` with the stored one without consuming it. Returns the cache key.
    async fn check_code(
        &self,
        purpose: CodePurpose,
        email: &Email,
        code: &str,
    ) -> Result<String, AuthError> {
        let key = code_key(purpose, email.as_str());
        let expected = self
            .cache
            .get(&key)
            .await?
            .ok_or(AuthError::CodeExpired)?;

        if expected != code {
            return Err(AuthError::IncorrectCode);
        }
        Ok(key)
    }

    /// Generate, store, and email a code on a detached task.
    fn dispatch_code(&self, purpose: CodePurpose, email: Email) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let mailer = Arc::clone(&self.mailer);
        let ttl = self.settings.code_ttl;
        let span = tracing::info_span!("dispatch_code", purpose = purpose.as_str(), email = %email);

        tokio::spawn(
            async move {
                match send_code(cache.as_ref(), mailer.as_ref(), purpose, &email, ttl).await {
                    Ok(()) => tracing::debug!("Verification code dispatched"),
                    Err(e) => tracing::error!(error = %e, "Failed to dispatch verification code"),
                }
            }
            .instrument(span),
        )
    }
}

async fn send_code(
    cache: &dyn KeyValueCache,
    mailer: &dyn Mailer,
    purpose: CodePurpose,
    email: &Email,
    ttl: Duration,
) -> Result<(), DispatchError> {
    let code = generate_verification_code();
    cache
        .set(&code_key(purpose, email.as_str()), &code, ttl)
        .await?;

    let message = OutgoingEmail::verification_code(email, &code, purpose, &describe_ttl(ttl))?;
    mailer.send(message).await?;
    Ok(())
}

/// Human wording for a code lifetime, e.g. "1 minute" or "90 seconds".
fn describe_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_owned(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        _ if secs == 1 => "1 second".to_owned(),
        _ => format!("{secs} seconds"),
    }
}

/// Validate a first or last name.
///
/// # Errors
///
/// Returns `AuthError::Validation` naming `field` if the trimmed length is
/// outside `MIN_NAME_LENGTH..=MAX_NAME_LENGTH`.
pub fn validate_name(field: &str, value: &str) -> Result<(), AuthError> {
    let len = value.trim().chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
        return Err(AuthError::Validation(format!(
            "{field} must be between {MIN_NAME_LENGTH} and {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
