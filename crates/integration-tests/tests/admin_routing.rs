//! Dispatcher behavior that is independent of any one resource.

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use storekeep_integration_tests::{TestApp, body_json, body_text};

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    let resp = app.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "ok");

    assert_eq!(app.get("/health/ready", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new();
    let resp = app.get("/nope", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "Not found" }));

    // Known path, wrong method
    let resp = app
        .send_json(Method::DELETE, "/api/categories", None, &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_landing_page_is_public() {
    let app = TestApp::new();
    let resp = app.get("/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let app = TestApp::new();
    let resp = app.get("/", None).await;
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert!(resp.headers().contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    let huge = "x".repeat(2 * 1024 * 1024);
    let resp = app
        .send_json(
            Method::POST,
            "/api/createCategory",
            Some(&cookie),
            &json!({ "title": huge }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
