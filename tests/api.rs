mod support;

use axum::http::StatusCode;
use serde_json::json;

use support::{
    TestApp, authed_get, authed_json_request, body_json, get, json_request, ScriptedCompletion,
};

#[tokio::test]
async fn bootstrap_login_creates_exactly_one_admin() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "a", "password": "a"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Default admin created and logged in");
    let token = body["token"].as_str().expect("token").to_string();
    assert_eq!(app.store.state.lock().await.admins.len(), 1);

    let response = app.send(authed_get("/api/admin/media", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Second login verifies against the stored hash instead of bootstrapping again.
    let response = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "a", "password": "a"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("message").is_none());
    assert_eq!(app.store.state.lock().await.admins.len(), 1);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let app = TestApp::new();
    app.admin_token().await;

    let wrong_password = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "a", "password": "nope"}),
        ))
        .await;
    let unknown_user = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "ghost", "password": "nope"}),
        ))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn bootstrap_pair_stops_working_after_credentials_change() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/api/admin/update-credentials",
            &token,
            &json!({"username": "editor", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Credentials updated successfully"
    );

    let bootstrap = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "a", "password": "a"}),
        ))
        .await;
    assert_eq!(bootstrap.status(), StatusCode::UNAUTHORIZED);

    let renamed = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "editor", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    assert_eq!(app.store.state.lock().await.admins.len(), 1);
}

#[tokio::test]
async fn update_credentials_rejects_blank_fields() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/api/admin/update-credentials",
            &token,
            &json!({"username": "  ", "password": "secret"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_a_valid_bearer_token() {
    let app = TestApp::new();

    let missing = app.send(get("/api/admin/analytics")).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(missing).await;
    assert_eq!(body["error"]["code"], "unauthorized");

    let garbage = app
        .send(authed_get("/api/admin/analytics", "not-a-token"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let create = app
        .send(json_request(
            "POST",
            "/api/posts",
            &json!({"title": "Hi", "content": "There"}),
        ))
        .await;
    assert_eq!(create.status(), StatusCode::UNAUTHORIZED);
    assert!(app.store.state.lock().await.posts.is_empty());
}

#[tokio::test]
async fn subscribing_twice_is_rejected_while_active() {
    let app = TestApp::new();
    let payload = json!({"email": "reader@example.com", "name": "Reader"});

    let first = app
        .send(json_request("POST", "/api/newsletter/subscribe", &payload))
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_json(first).await["message"], "Successfully subscribed!");

    let second = app
        .send(json_request("POST", "/api/newsletter/subscribe", &payload))
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "already_subscribed");
    assert_eq!(body["error"]["message"], "Already subscribed!");
    assert_eq!(app.store.state.lock().await.newsletters.len(), 1);
}

#[tokio::test]
async fn resubscribing_reactivates_and_only_overwrites_supplied_names() {
    let app = TestApp::new();
    let email = "lapsed@example.com";

    app.send(json_request(
        "POST",
        "/api/newsletter/subscribe",
        &json!({"email": email, "name": "Old Name"}),
    ))
    .await;
    app.store.deactivate_subscriber(email).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/newsletter/subscribe",
            &json!({"email": email, "name": "New Name"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Subscription reactivated!");
    {
        let state = app.store.state.lock().await;
        assert!(state.newsletters[0].is_active);
        assert_eq!(state.newsletters[0].name.as_deref(), Some("New Name"));
    }

    app.store.deactivate_subscriber(email).await;
    let response = app
        .send(json_request(
            "POST",
            "/api/newsletter/subscribe",
            &json!({"email": email}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let state = app.store.state.lock().await;
    assert_eq!(state.newsletters[0].name.as_deref(), Some("New Name"));
}

#[tokio::test]
async fn newsletter_requires_email() {
    let app = TestApp::new();
    let response = app
        .send(json_request(
            "POST",
            "/api/newsletter/subscribe",
            &json!({"name": "No Email"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_with_blank_field_is_rejected_without_insert() {
    let app = TestApp::new();
    let post = app.store.insert_post("Hello", "hello", true).await;

    for payload in [
        json!({"postId": post.id, "authorName": "", "authorEmail": "x@y.z", "content": "hi"}),
        json!({"postId": post.id, "authorName": "X", "authorEmail": "   ", "content": "hi"}),
        json!({"postId": post.id, "authorName": "X", "authorEmail": "x@y.z"}),
        json!({"authorName": "X", "authorEmail": "x@y.z", "content": "hi"}),
    ] {
        let response = app
            .send(json_request("POST", "/api/comments", &payload))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
    }

    assert!(app.store.state.lock().await.comments.is_empty());
}

#[tokio::test]
async fn comments_enter_moderation_and_only_approved_are_listed() {
    let app = TestApp::new();
    let post = app.store.insert_post("Hello", "hello", true).await;
    app.store.insert_comment(post.id, "early", true).await;
    app.store.insert_comment(post.id, "late", true).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/comments",
            &json!({
                "postId": post.id.to_string(),
                "authorName": "Reader",
                "authorEmail": "reader@example.com",
                "content": "Nice post",
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await["message"],
        "Comment submitted for review"
    );

    let response = app
        .send(get(&format!("/api/comments?postId={}", post.id)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<_> = body["comments"]
        .as_array()
        .expect("comments")
        .iter()
        .map(|comment| comment["authorName"].as_str().expect("name").to_string())
        .collect();
    assert_eq!(names, ["early", "late"]);
    assert!(body["comments"][0].get("authorEmail").is_none());
}

#[tokio::test]
async fn comments_listing_requires_numeric_post_id() {
    let app = TestApp::new();

    let missing = app.send(get("/api/comments")).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let junk = app.send(get("/api/comments?postId=abc")).await;
    assert_eq!(junk.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_for_unknown_post_is_a_client_error() {
    let app = TestApp::new();
    let response = app
        .send(json_request(
            "POST",
            "/api/comments",
            &json!({
                "postId": 999,
                "authorName": "Reader",
                "authorEmail": "reader@example.com",
                "content": "Hello?",
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetching_a_post_increments_views_by_one_each_time() {
    let app = TestApp::new();
    let post = app.store.insert_post("Counting", "counting", true).await;
    app.store.insert_comment(post.id, "first", true).await;
    app.store.insert_comment(post.id, "second", true).await;
    app.store.insert_comment(post.id, "hidden", false).await;

    let response = app.send(get("/api/posts/counting")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["post"]["authorName"], "Admin");
    assert_eq!(body["post"]["views"], 1);
    let comments = body["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["authorName"], "second");
    assert_eq!(app.store.post_views("counting").await, 1);

    app.send(get("/api/posts/counting")).await;
    assert_eq!(app.store.post_views("counting").await, 2);
}

#[tokio::test]
async fn unpublished_posts_are_not_served() {
    let app = TestApp::new();
    app.store.insert_post("Draft", "draft", false).await;

    let response = app.send(get("/api/posts/draft")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.post_views("draft").await, 0);

    let response = app.send(get("/api/posts")).await;
    let body = body_json(response).await;
    assert!(body["posts"].as_array().expect("posts").is_empty());
}

#[tokio::test]
async fn short_search_returns_empty_without_touching_store() {
    let app = TestApp::new();
    app.store.insert_post("Rust tips", "rust-tips", true).await;

    let response = app.send(get("/api/search?q=r")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"results": []}));
    assert_eq!(app.store.state.lock().await.search_calls, 0);

    let response = app.send(get("/api/search?q=Rust")).await;
    let body = body_json(response).await;
    assert_eq!(body["results"][0]["slug"], "rust-tips");
    assert_eq!(app.store.state.lock().await.search_calls, 1);
}

#[tokio::test]
async fn manual_post_creation_derives_unique_slugs() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let payload = json!({"title": "Hello World", "content": "one two three", "published": true});

    let first = app
        .send(authed_json_request("POST", "/api/posts", &token, &payload))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["slug"], "hello-world");
    assert_eq!(first["readingTime"], 1);

    let second = app
        .send(authed_json_request("POST", "/api/posts", &token, &payload))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(body_json(second).await["slug"], "hello-world-2");

    let missing = app
        .send(authed_json_request(
            "POST",
            "/api/posts",
            &token,
            &json!({"title": "No body"}),
        ))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generated_draft_falls_back_to_raw_text() {
    let app = TestApp::with_completion(ScriptedCompletion::replying("<p>Plain answer</p>"));
    let token = app.admin_token().await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/api/admin/generate-post",
            &token,
            &json!({"idea": "Rust ownership"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Rust ownership");
    assert_eq!(body["content"], "<p>Plain answer</p>");
    assert_eq!(
        body["coverImage"],
        "https://source.unsplash.com/1200x600/?Rust"
    );
    assert!(app.store.state.lock().await.posts.is_empty());
}

#[tokio::test]
async fn bot_post_is_published_and_upstream_failure_is_500() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let response = app
        .send(authed_json_request(
            "POST",
            "/api/admin/bot-generate-post",
            &token,
            &json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Post generated and published successfully!");
    let slug = body["slug"].as_str().expect("slug").to_string();
    {
        let state = app.store.state.lock().await;
        let post = state
            .posts
            .iter()
            .find(|post| post.slug == slug)
            .expect("stored");
        assert!(post.published);
    }

    let failing = TestApp::with_completion(ScriptedCompletion::failing(502));
    let token = failing.admin_token().await;
    let response = failing
        .send(authed_json_request(
            "POST",
            "/api/admin/bot-generate-post",
            &token,
            &json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(failing.store.state.lock().await.posts.is_empty());
}

#[tokio::test]
async fn chat_requires_a_message() {
    let app = TestApp::new();

    let empty = app
        .send(json_request("POST", "/api/chat", &json!({"message": " "})))
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/chat",
            &json!({"message": "What is this blog about?"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["response"], "Sure, happy to help.");
    let requests = app.completion.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].app_title, "Blog Chat Assistant");
}

#[tokio::test]
async fn analytics_rejects_unknown_range() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let response = app
        .send(authed_get("/api/admin/analytics?range=yesterday", &token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.store.insert_post("Hello", "hello", true).await;
    let response = app
        .send(authed_get("/api/admin/analytics?range=all", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["range"], "all");
    assert_eq!(body["totalPosts"], 1);
    assert_eq!(body["recentActivity"][0]["type"], "post");
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/newsletter/subscribe")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn health_and_fallback() {
    let app = TestApp::new();

    let health = app.send(get("/_health/db")).await;
    assert_eq!(health.status(), StatusCode::NO_CONTENT);

    let missing = app.send(get("/api/nowhere")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn categories_are_public_and_sorted_by_name() {
    let app = TestApp::new();

    let response = app.send(get("/api/categories")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"categories": []}));

    app.store.insert_category("Travel", "travel").await;
    app.store.insert_category("Engineering", "engineering").await;

    let response = app.send(get("/api/categories")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let slugs: Vec<_> = body["categories"]
        .as_array()
        .expect("categories")
        .iter()
        .map(|category| category["slug"].as_str().expect("slug").to_string())
        .collect();
    assert_eq!(slugs, ["engineering", "travel"]);
    assert!(body["categories"][0]["description"].is_null());
    assert!(body["categories"][0]["createdAt"].is_string());
}
