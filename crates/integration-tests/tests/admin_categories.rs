//! Category API end to end.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use storekeep_integration_tests::{TestApp, body_json, field, multipart_body};

async fn create(app: &TestApp, cookie: &str, body: Value) -> Value {
    let resp = app
        .send_json(Method::POST, "/api/createCategory", Some(cookie), &body)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["category"].clone()
}

async fn titles(app: &TestApp, cookie: &str) -> Vec<String> {
    let resp = app.get("/api/categories", Some(cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_list_delete() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;

    let tea = create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;
    assert_eq!(tea["title"], "Tea");
    assert_eq!(tea["parent"], Value::Null);
    assert_eq!(titles(&app, &cookie).await, vec!["Tea"]);

    let path = format!("/api/delete/{}", tea["id"]);
    let resp = app
        .send_json(Method::DELETE, &path, Some(&cookie), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["deleted"], json!([tea["id"]]));
    assert!(titles(&app, &cookie).await.is_empty());
}

#[tokio::test]
async fn test_duplicate_create_is_rejected() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;

    let resp = app
        .send_json(
            Method::POST,
            "/api/createCategory",
            Some(&cookie),
            &json!({ "title": "TEA", "code": "T2" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "A category with this title already exists"
    );
    assert_eq!(titles(&app, &cookie).await, vec!["Tea"]);
}

#[tokio::test]
async fn test_update_renames_and_cascades() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    let tea = create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;
    create(
        &app,
        &cookie,
        json!({ "title": "Green", "code": "GRN", "parent": "Tea" }),
    )
    .await;

    let resp = app
        .send_json(
            Method::PUT,
            &format!("/api/update/{}", tea["id"]),
            Some(&cookie),
            &json!({ "title": "Teas", "code": "TEA" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["category"]["title"], "Teas");

    let resp = app.get("/api/categories", Some(&cookie)).await;
    let categories = body_json(resp).await["categories"].clone();
    let green = categories
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["title"] == "Green")
        .unwrap();
    assert_eq!(green["parent"], "Teas");
}

#[tokio::test]
async fn test_update_errors() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    let tea = create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;
    create(
        &app,
        &cookie,
        json!({ "title": "Green", "code": "GRN", "parent": "Tea" }),
    )
    .await;
    let tea_path = format!("/api/update/{}", tea["id"]);

    let resp = app
        .send_json(Method::PUT, "/api/update/abc", Some(&cookie), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send_json(
            Method::PUT,
            "/api/update/999",
            Some(&cookie),
            &json!({ "title": "X", "code": "X" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .send_json(
            Method::PUT,
            &tea_path,
            Some(&cookie),
            &json!({ "title": "Tea", "code": "TEA" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No changes to save");

    let resp = app
        .send_json(
            Method::PUT,
            &tea_path,
            Some(&cookie),
            &json!({ "title": "Tea", "code": "TEA", "parent": "Green" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "A category cannot be moved under one of its subcategories"
    );
}

#[tokio::test]
async fn test_delete_in_use_subtree_conflicts() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    let tea = create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;
    let green = create(
        &app,
        &cookie,
        json!({ "title": "Green", "code": "GRN", "parent": "Tea" }),
    )
    .await;

    let body = multipart_body(&[
        field("sku", "SEN-1"),
        field("title", "Sencha"),
        field("brand", "Leaf Co"),
        field("category_id", &green["id"].to_string()),
        field("price", "9.99"),
    ]);
    let resp = app
        .send_multipart(Method::POST, "/api/createProduct", Some(&cookie), body)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .send_json(
            Method::DELETE,
            &format!("/api/delete/{}", tea["id"]),
            Some(&cookie),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(titles(&app, &cookie).await, vec!["Green", "Tea"]);
}

#[tokio::test]
async fn test_delete_removes_descendants() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    let tea = create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;
    create(
        &app,
        &cookie,
        json!({ "title": "Green", "code": "GRN", "parent": "Tea" }),
    )
    .await;
    create(
        &app,
        &cookie,
        json!({ "title": "Matcha", "code": "MAT", "parent": "Green" }),
    )
    .await;
    create(&app, &cookie, json!({ "title": "Coffee", "code": "COF" })).await;

    let resp = app
        .send_json(
            Method::DELETE,
            &format!("/api/delete/{}", tea["id"]),
            Some(&cookie),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["deleted"].as_array().unwrap().len(), 3);
    assert_eq!(titles(&app, &cookie).await, vec!["Coffee"]);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new();
    let cookie = app.login_cookie().await;
    create(&app, &cookie, json!({ "title": "Tea", "code": "TEA" })).await;

    let resp = app.get("/api/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "categories": 1,
            "products": 0,
            "enabled_products": 0,
            "featured_products": 0,
        })
    );
}
