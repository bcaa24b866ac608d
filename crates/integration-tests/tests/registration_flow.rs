//! Two-phase registration through the HTTP surface.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use quillpost_api::cache::KeyValueCache;
use quillpost_api::db::UserStore;
use quillpost_api::services::auth::{AuthSettings, verify_password};
use quillpost_core::{Email, UserType};
use quillpost_integration_tests::{TEST_PASSWORD, TestContext, extract_code, registration_body};

async fn user_count(ctx: &TestContext) -> i64 {
    let resp = ctx.get("/v1/users", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.body["count"].as_i64().unwrap()
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_register_then_verify_creates_exactly_one_user() {
    let ctx = TestContext::new();

    let resp = ctx
        .post(
            "/v1/auth/register",
            None,
            registration_body("ada@example.com", UserType::Owner),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body, json!({ "message": "Verification code has been sent!" }));
    assert_eq!(user_count(&ctx).await, 0);

    let code = ctx.next_code().await;
    let resp = ctx
        .post(
            "/v1/auth/verify",
            None,
            json!({ "email": "ada@example.com", "code": code }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    assert_eq!(resp.body["email"], "ada@example.com");
    assert_eq!(resp.body["first_name"], "Ada");
    assert_eq!(resp.body["type"], "owner");
    assert_eq!(resp.body["dob"], "1995-12-10");
    assert!(resp.body["access_token"].is_string());
    assert!(resp.body.get("password_hash").is_none());

    assert_eq!(user_count(&ctx).await, 1);

    let stored = ctx
        .state
        .store()
        .users
        .get_by_email(&Email::parse("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, TEST_PASSWORD);
    assert!(verify_password(TEST_PASSWORD, &stored.password_hash).is_ok());

    let token = resp.body["access_token"].as_str().unwrap();
    let me = ctx.get("/v1/users/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], resp.body["id"]);
}

#[tokio::test]
async fn test_email_contains_the_cached_code() {
    let ctx = TestContext::new();
    ctx.post(
        "/v1/auth/register",
        None,
        registration_body("ada@example.com", UserType::Guest),
    )
    .await;

    let email = ctx.next_email().await;
    assert_eq!(email.to.as_str(), "ada@example.com");
    let code = extract_code(&email);

    let cached = ctx
        .cache
        .get("register_code_ada@example.com")
        .await
        .unwrap();
    assert_eq!(cached.as_deref(), Some(code.as_str()));
    assert!(
        ctx.cache
            .get("user_ada@example.com")
            .await
            .unwrap()
            .is_some()
    );
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_verify_without_pending_registration_is_forbidden() {
    let ctx = TestContext::new();

    let resp = ctx
        .post(
            "/v1/auth/verify",
            None,
            json!({ "email": "ghost@example.com", "code": "123456" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"], "registration not found or expired");
    assert_eq!(user_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_wrong_code_is_forbidden_and_creates_nothing() {
    let ctx = TestContext::new();
    ctx.post(
        "/v1/auth/register",
        None,
        registration_body("ada@example.com", UserType::Owner),
    )
    .await;
    let code = ctx.next_code().await;
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let resp = ctx
        .post(
            "/v1/auth/verify",
            None,
            json!({ "email": "ada@example.com", "code": wrong }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"], "incorrect verification code");
    assert_eq!(user_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_expired_code_is_forbidden() {
    let ctx = TestContext::with_settings(AuthSettings {
        code_ttl: Duration::from_millis(50),
        ..AuthSettings::default()
    });
    ctx.post(
        "/v1/auth/register",
        None,
        registration_body("ada@example.com", UserType::Owner),
    )
    .await;
    let code = ctx.next_code().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let resp = ctx
        .post(
            "/v1/auth/verify",
            None,
            json!({ "email": "ada@example.com", "code": code }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"], "verification code has been expired");
    assert_eq!(user_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_existing_email_conflicts_before_caching() {
    let ctx = TestContext::new();
    ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .post(
            "/v1/auth/register",
            None,
            registration_body("ada@example.com", UserType::Guest),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "email already exists");

    assert!(
        ctx.cache
            .get("user_ada@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_registration_input_validation() {
    let ctx = TestContext::new();

    let mut superadmin = registration_body("a@example.com", UserType::Owner);
    superadmin["type"] = json!("superadmin");
    let resp = ctx.post("/v1/auth/register", None, superadmin).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let mut short_password = registration_body("b@example.com", UserType::Owner);
    short_password["password"] = json!("12345");
    let resp = ctx.post("/v1/auth/register", None, short_password).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].as_str().unwrap().contains("password"));

    let mut long_name = registration_body("c@example.com", UserType::Owner);
    long_name["first_name"] = json!("x".repeat(31));
    let resp = ctx.post("/v1/auth/register", None, long_name).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let mut bad_email = registration_body("d@example.com", UserType::Owner);
    bad_email["email"] = json!("not-an-email");
    let resp = ctx.post("/v1/auth/register", None, bad_email).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());

    let resp = ctx
        .post("/v1/auth/register", None, json!({ "email": "e@example.com" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("ada@example.com", UserType::Owner).await;

    let unknown = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    let wrong = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "not-the-pw" }),
        )
        .await;

    assert_eq!(unknown.status, StatusCode::FORBIDDEN);
    assert_eq!(wrong.status, StatusCode::FORBIDDEN);
    assert_eq!(unknown.body, wrong.body);
    assert_eq!(wrong.body["error"], "wrong email or password");
}

#[tokio::test]
async fn test_login_issues_day_long_token() {
    let ctx = TestContext::new();
    let (id, _) = ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["id"], id.as_i64());

    let claims = ctx
        .state
        .tokens()
        .verify(resp.body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
}
