//! Integration tests for Quillpost.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (in-memory store, cache, and mailer)
//! cargo test -p quillpost-integration-tests
//!
//! # Postgres store tests
//! DATABASE_URL=postgres://... cargo test -p quillpost-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `registration_flow` - Two-phase signup through the HTTP surface
//! - `password_reset` - Forgot/verify/update password and token lifetimes
//! - `resources` - Users, categories, posts, comments, likes, uploads
//! - `postgres_stores` - The `PostgreSQL` adapters against a real database

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{NaiveDate, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};
use tower::ServiceExt;

use quillpost_api::cache::MemoryCache;
use quillpost_api::db::{Store, UserStore};
use quillpost_api::models::NewUser;
use quillpost_api::services::auth::{AuthSettings, Claims, TokenIssuer, hash_password};
use quillpost_api::services::email::{EmailError, Mailer, OutgoingEmail};
use quillpost_api::{AppState, app};
use quillpost_core::{Email, UserId, UserType};

/// Signing key used by every test context.
pub const TEST_SECRET: &str = "k3Y!9vQ#2mZ@8xL$5pR^7tW&1nB*4cJ%";

/// Password given to every account the helpers create.
pub const TEST_PASSWORD: &str = "s3cret-pw";

/// Mailer that hands every message to the test instead of sending it.
pub struct CapturingMailer {
    tx: mpsc::UnboundedSender<OutgoingEmail>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let _ = self.tx.send(email);
        Ok(())
    }
}

/// A decoded HTTP response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// An API instance wired to in-memory adapters.
pub struct TestContext {
    pub state: AppState,
    pub router: Router,
    pub cache: Arc<MemoryCache>,
    pub media_dir: PathBuf,
    inbox: Mutex<mpsc::UnboundedReceiver<OutgoingEmail>>,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(AuthSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: AuthSettings) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let media_dir = std::env::temp_dir().join(format!("quillpost-media-{}", uuid::Uuid::new_v4()));

        let state = AppState::new(
            Store::memory(),
            cache.clone(),
            Arc::new(CapturingMailer { tx }),
            TokenIssuer::new(SecretString::from(TEST_SECRET)),
            settings,
            media_dir.clone(),
        );

        Self {
            router: app(state.clone()),
            state,
            cache,
            media_dir,
            inbox: Mutex::new(rx),
        }
    }

    // =========================================================================
    // HTTP
    // =========================================================================

    /// Send a JSON request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Send a prepared request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    // =========================================================================
    // Mail
    // =========================================================================

    /// Wait for the next captured email.
    pub async fn next_email(&self) -> OutgoingEmail {
        let mut inbox = self.inbox.lock().await;
        tokio::time::timeout(Duration::from_secs(5), inbox.recv())
            .await
            .expect("no email dispatched within 5s")
            .expect("mailer dropped")
    }

    /// Wait for the next email and pull the 6-digit code out of it.
    pub async fn next_code(&self) -> String {
        extract_code(&self.next_email().await)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register and verify through the API. Returns the new id and token.
    pub async fn register(&self, email: &str, user_type: UserType) -> (UserId, String) {
        let resp = self
            .post("/v1/auth/register", None, registration_body(email, user_type))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);

        let code = self.next_code().await;
        let resp = self
            .post("/v1/auth/verify", None, json!({ "email": email, "code": code }))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);

        let id = UserId::new(resp.body["id"].as_i64().unwrap());
        let token = resp.body["access_token"].as_str().unwrap().to_owned();
        (id, token)
    }

    /// Insert a superadmin directly and log in. Returns the id and token.
    pub async fn superadmin(&self, email: &str) -> (UserId, String) {
        let user = self
            .state
            .store()
            .users
            .create(&NewUser {
                first_name: "Root".to_owned(),
                last_name: "Admin".to_owned(),
                dob: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                email: Email::parse(email).unwrap(),
                phone_number: None,
                gender: None,
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                profile_image_url: None,
                address: None,
                user_type: UserType::SuperAdmin,
            })
            .await
            .unwrap();

        let resp = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
        (user.id, resp.body["access_token"].as_str().unwrap().to_owned())
    }

    /// A correctly signed token that expired a minute ago.
    #[must_use]
    pub fn expired_token(&self, user_id: UserId, email: &str) -> String {
        let now = Utc::now().timestamp();
        self.state
            .tokens()
            .encode(&Claims {
                sub: user_id,
                user_type: UserType::Owner,
                email: Email::parse(email).unwrap(),
                iat: now - 3600,
                exp: now - 60,
            })
            .unwrap()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}

/// Body for `POST /v1/auth/register`.
#[must_use]
pub fn registration_body(email: &str, user_type: UserType) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "dob": "1995-12-10",
        "email": email,
        "password": TEST_PASSWORD,
        "type": user_type.as_str(),
    })
}

/// The first 6-digit word in the plain-text body.
#[must_use]
pub fn extract_code(email: &OutgoingEmail) -> String {
    email
        .text
        .split_whitespace()
        .find(|w| w.len() == 6 && w.bytes().all(|b| b.is_ascii_digit()))
        .expect("email has no 6-digit code")
        .to_owned()
}
