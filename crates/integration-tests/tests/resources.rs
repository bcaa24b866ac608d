//! Users, categories, posts, comments, likes, and uploads over HTTP.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};

use quillpost_core::UserType;
use quillpost_integration_tests::TestContext;

async fn create_category(ctx: &TestContext, admin: &str, title: &str) -> i64 {
    let resp = ctx
        .post("/v1/categories", Some(admin), json!({ "title": title }))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    resp.body["id"].as_i64().unwrap()
}

async fn create_post(ctx: &TestContext, token: &str, category_id: i64, title: &str) -> i64 {
    let resp = ctx
        .post(
            "/v1/posts",
            Some(token),
            json!({
                "title": title,
                "description": "Body text",
                "category_id": category_id,
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    resp.body["id"].as_i64().unwrap()
}

fn like_info(post: &Value) -> (i64, i64) {
    (
        post["like_info"]["likes_count"].as_i64().unwrap(),
        post["like_info"]["dislikes_count"].as_i64().unwrap(),
    )
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_only_superadmin_manages_categories() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (_, owner) = ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .post("/v1/categories", Some(&owner), json!({ "title": "Rust" }))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"], "forbidden");

    let resp = ctx
        .post("/v1/categories", None, json!({ "title": "Rust" }))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let id = create_category(&ctx, &admin, "Rust").await;

    let resp = ctx
        .put(
            &format!("/v1/categories/{id}"),
            Some(&admin),
            json!({ "title": "Systems" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["title"], "Systems");

    let resp = ctx.get(&format!("/v1/categories/{id}"), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["title"], "Systems");

    let resp = ctx
        .delete(&format!("/v1/categories/{id}"), Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({ "message": "successfully deleted" }));

    let resp = ctx.get(&format!("/v1/categories/{id}"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx
        .delete(&format!("/v1/categories/{id}"), Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_pagination_and_search() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    for n in 0..15 {
        create_category(&ctx, &admin, &format!("Topic {n:02}")).await;
    }

    let resp = ctx.get("/v1/categories?limit=10&page=2", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["categories"].as_array().unwrap().len(), 5);
    assert_eq!(resp.body["count"], 15);

    let resp = ctx.get("/v1/categories?search=topic%201", None).await;
    assert_eq!(resp.body["count"], 5);

    let resp = ctx.get("/v1/categories?limit=0", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_delete_cascades_to_posts() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (_, owner) = ctx.register("ada@example.com", UserType::Owner).await;
    let doomed = create_category(&ctx, &admin, "Doomed").await;
    let kept = create_category(&ctx, &admin, "Kept").await;

    let p1 = create_post(&ctx, &owner, doomed, "One").await;
    let p2 = create_post(&ctx, &owner, kept, "Two").await;

    ctx.delete(&format!("/v1/categories/{doomed}"), Some(&admin))
        .await;

    assert_eq!(
        ctx.get(&format!("/v1/posts/{p1}"), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ctx.get(&format!("/v1/posts/{p2}"), None).await.status,
        StatusCode::OK
    );
}

// ============================================================================
// Posts
// ============================================================================

#[tokio::test]
async fn test_post_lifecycle_and_permissions() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (author_id, author) = ctx.register("ada@example.com", UserType::Owner).await;
    let (_, other) = ctx.register("bob@example.com", UserType::Guest).await;
    let category = create_category(&ctx, &admin, "Rust").await;

    let id = create_post(&ctx, &author, category, "Ownership").await;

    let resp = ctx.get(&format!("/v1/posts/{id}"), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user_id"], author_id.as_i64());
    assert_eq!(resp.body["views_count"], 1);
    assert_eq!(like_info(&resp.body), (0, 0));

    let resp = ctx.get(&format!("/v1/posts/{id}"), None).await;
    assert_eq!(resp.body["views_count"], 2);

    let edit = json!({
        "title": "Borrowing",
        "description": "Edited",
        "category_id": category,
    });
    let resp = ctx
        .put(&format!("/v1/posts/{id}"), Some(&other), edit.clone())
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx
        .put(&format!("/v1/posts/{id}"), Some(&author), edit)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["title"], "Borrowing");
    assert!(resp.body["updated_at"].is_string());

    let resp = ctx.delete(&format!("/v1/posts/{id}"), Some(&other)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.delete(&format!("/v1/posts/{id}"), Some(&admin)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = ctx.get(&format!("/v1/posts/{id}"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_requires_existing_category() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .post(
            "/v1/posts",
            Some(&owner),
            json!({ "title": "Orphan", "description": "x", "category_id": 999 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "category does not exist");
}

#[tokio::test]
async fn test_post_listing_filters_and_sort() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (ada_id, ada) = ctx.register("ada@example.com", UserType::Owner).await;
    let (_, bob) = ctx.register("bob@example.com", UserType::Owner).await;
    let rust = create_category(&ctx, &admin, "Rust").await;
    let go = create_category(&ctx, &admin, "Go").await;

    let first = create_post(&ctx, &ada, rust, "First rust post").await;
    create_post(&ctx, &bob, rust, "Second rust post").await;
    let last = create_post(&ctx, &ada, go, "A go post").await;

    let resp = ctx.get("/v1/posts", None).await;
    assert_eq!(resp.body["count"], 3);
    assert_eq!(resp.body["posts"][0]["id"], last);
    assert!(resp.body["posts"][0]["like_info"].is_object());

    let resp = ctx.get("/v1/posts?sort_by_date=asc", None).await;
    assert_eq!(resp.body["posts"][0]["id"], first);

    let resp = ctx.get(&format!("/v1/posts?category_id={rust}"), None).await;
    assert_eq!(resp.body["count"], 2);

    let resp = ctx.get(&format!("/v1/posts?user_id={ada_id}"), None).await;
    assert_eq!(resp.body["count"], 2);

    let resp = ctx.get("/v1/posts?search=RUST", None).await;
    assert_eq!(resp.body["count"], 2);

    let resp = ctx.get("/v1/posts?sort_by_date=sideways", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_lifecycle_and_permissions() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (ada_id, ada) = ctx.register("ada@example.com", UserType::Owner).await;
    let (_, bob) = ctx.register("bob@example.com", UserType::Guest).await;
    let category = create_category(&ctx, &admin, "Rust").await;
    let post = create_post(&ctx, &ada, category, "Ownership").await;

    let resp = ctx
        .post(
            "/v1/comments",
            Some(&ada),
            json!({ "post_id": post, "description": "First!" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let comment = resp.body["id"].as_i64().unwrap();

    ctx.post(
        "/v1/comments",
        Some(&bob),
        json!({ "post_id": post, "description": "Second" }),
    )
    .await;

    let resp = ctx.get(&format!("/v1/comments?post_id={post}"), None).await;
    assert_eq!(resp.body["count"], 2);
    assert_eq!(resp.body["comments"][0]["description"], "Second");
    assert_eq!(resp.body["comments"][1]["user"]["id"], ada_id.as_i64());
    assert_eq!(resp.body["comments"][1]["user"]["first_name"], "Ada");

    let resp = ctx
        .get(&format!("/v1/comments?user_id={ada_id}"), None)
        .await;
    assert_eq!(resp.body["count"], 1);

    let edit = json!({ "description": "Edited" });
    let resp = ctx
        .put(&format!("/v1/comments/{comment}"), Some(&bob), edit.clone())
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let resp = ctx
        .put(&format!("/v1/comments/{comment}"), Some(&admin), edit.clone())
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let resp = ctx
        .put(&format!("/v1/comments/{comment}"), Some(&ada), edit)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["description"], "Edited");

    let resp = ctx
        .delete(&format!("/v1/comments/{comment}"), Some(&bob))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let resp = ctx
        .delete(&format!("/v1/comments/{comment}"), Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = ctx
        .post(
            "/v1/comments",
            Some(&ada),
            json!({ "post_id": 999, "description": "Nowhere" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "post does not exist");
}

// ============================================================================
// Likes
// ============================================================================

#[tokio::test]
async fn test_like_toggle_semantics() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (_, ada) = ctx.register("ada@example.com", UserType::Owner).await;
    let (_, bob) = ctx.register("bob@example.com", UserType::Guest).await;
    let category = create_category(&ctx, &admin, "Rust").await;
    let post = create_post(&ctx, &ada, category, "Ownership").await;
    let post_uri = format!("/v1/posts/{post}");
    let mine = format!("/v1/likes/user-post?post_id={post}");

    let resp = ctx.get(&mine, Some(&bob)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let like = json!({ "post_id": post, "status": true });
    let dislike = json!({ "post_id": post, "status": false });

    let resp = ctx.post("/v1/likes", Some(&bob), like.clone()).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Successfully finished");
    assert_eq!(resp.body["outcome"], "created");
    assert_eq!(like_info(&ctx.get(&post_uri, None).await.body), (1, 0));

    let resp = ctx.get(&mine, Some(&bob)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], true);

    let resp = ctx.post("/v1/likes", Some(&bob), dislike.clone()).await;
    assert_eq!(resp.body["outcome"], "updated");
    assert_eq!(like_info(&ctx.get(&post_uri, None).await.body), (0, 1));

    ctx.post("/v1/likes", Some(&ada), like.clone()).await;
    assert_eq!(like_info(&ctx.get(&post_uri, None).await.body), (1, 1));

    let resp = ctx.post("/v1/likes", Some(&bob), dislike).await;
    assert_eq!(resp.body["outcome"], "removed");
    assert_eq!(like_info(&ctx.get(&post_uri, None).await.body), (1, 0));

    let resp = ctx.get(&mine, Some(&bob)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx.post("/v1/likes", None, like).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Users
// ============================================================================

fn profile_update(user_type: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Byron",
        "dob": "1995-12-10",
        "email": "ada@example.com",
        "phone_number": "+44 20 7946 0000",
        "gender": "female",
        "address": "London",
        "type": user_type,
    })
}

#[tokio::test]
async fn test_user_profile_rules() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (ada_id, ada) = ctx.register("ada@example.com", UserType::Guest).await;
    let (bob_id, bob) = ctx.register("bob@example.com", UserType::Guest).await;
    let ada_uri = format!("/v1/users/{ada_id}");

    let resp = ctx.get(&ada_uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["email"], "ada@example.com");

    let resp = ctx
        .put(&ada_uri, Some(&bob), profile_update("guest"))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx
        .put(&ada_uri, Some(&ada), profile_update("owner"))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx
        .put(&ada_uri, Some(&ada), profile_update("guest"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["last_name"], "Byron");
    assert_eq!(resp.body["gender"], "female");

    let resp = ctx
        .put(&ada_uri, Some(&admin), profile_update("owner"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["type"], "owner");

    let mut steal = profile_update("guest");
    steal["email"] = json!("ada@example.com");
    let resp = ctx
        .put(&format!("/v1/users/{bob_id}"), Some(&bob), steal)
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx.get("/v1/users?search=byron", None).await;
    assert_eq!(resp.body["count"], 1);
    assert_eq!(resp.body["users"][0]["id"], ada_id.as_i64());

    let resp = ctx.delete(&ada_uri, Some(&bob)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.delete(&ada_uri, Some(&ada)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ctx.get(&ada_uri, None).await.status, StatusCode::NOT_FOUND);

    let resp = ctx.get("/v1/users/me", Some(&ada)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_superadmin_creates_users_directly() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (_, owner) = ctx.register("ada@example.com", UserType::Owner).await;

    let body = json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "dob": "1906-12-09",
        "email": "grace@example.com",
        "password": "c0bol-pw",
        "type": "superadmin",
    });

    let resp = ctx.post("/v1/users", Some(&owner), body.clone()).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.post("/v1/users", Some(&admin), body.clone()).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["type"], "superadmin");

    let resp = ctx.post("/v1/users", Some(&admin), body).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "grace@example.com", "password": "c0bol-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_user_delete_removes_their_content() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.superadmin("root@example.com").await;
    let (ada_id, ada) = ctx.register("ada@example.com", UserType::Owner).await;
    let category = create_category(&ctx, &admin, "Rust").await;
    let post = create_post(&ctx, &ada, category, "Ownership").await;

    let resp = ctx
        .delete(&format!("/v1/users/{ada_id}"), Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = ctx.get(&format!("/v1/posts/{post}"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Uploads
// ============================================================================

fn multipart_request(token: Option<&str>, field: &str, file_name: &str, data: &str) -> Request<Body> {
    let boundary = "quillpost-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {data}\r\n\
         --{boundary}--\r\n"
    );

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/v1/file-upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_file_upload_is_stored_and_served() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .send(multipart_request(Some(&token), "file", "cat.PNG", "not-really-a-png"))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);

    let path = resp.body["filename"].as_str().unwrap().to_owned();
    assert!(path.starts_with("/media/"));
    assert!(path.ends_with(".png"));

    let served = ctx.get(&path, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, Value::String("not-really-a-png".to_owned()));
}

#[tokio::test]
async fn test_file_upload_rejections() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("ada@example.com", UserType::Owner).await;

    let resp = ctx
        .send(multipart_request(None, "file", "cat.png", "data"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = ctx
        .send(multipart_request(Some(&token), "avatar", "cat.png", "data"))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "multipart field 'file' is required");

    let resp = ctx
        .post("/v1/file-upload", Some(&token), json!({ "file": "x" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
