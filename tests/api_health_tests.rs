//! 健康检查 API 集成测试

use axum::http::StatusCode;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let app = TestApp::new();

    let response = app.get("/ready", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ready"], true);
    assert_eq!(response.body["checks"][0]["name"], "storage");
    assert_eq!(response.body["checks"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_not_found_endpoint() {
    let app = TestApp::new();

    let response = app.get("/nonexistent", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_path_id() {
    let app = TestApp::new();

    let response = app.get("/api/v1/posts/not-a-uuid", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_error_body(&response, 400);
}

#[tokio::test]
async fn test_malformed_path_id_on_gated_route() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("pathuser").await;

    let response = app
        .delete("/api/v1/groups/not-a-uuid/moderators/also-not", Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_error_body(&response, 400);
}

#[tokio::test]
async fn test_malformed_query_string() {
    let app = TestApp::new();

    let response = app.get("/api/v1/posts?page=abc", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_error_body(&response, 400);

    let response = app.get("/api/v1/posts?groupId=nope", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_error_body(&response, 400);
}

#[tokio::test]
async fn test_error_body_carries_response_request_id() {
    let app = TestApp::new();

    let response = app.get(&format!("/api/v1/posts/{}", uuid::Uuid::new_v4()), None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let header = response
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-request-id header");
    assert_eq!(response.body["error"]["request_id"], header);

    // Each request gets its own id
    let again = app.get("/api/v1/posts/not-a-uuid", None).await;
    assert_eq!(
        again.body["error"]["request_id"],
        again.headers["x-request-id"].to_str().unwrap()
    );
    assert_ne!(again.body["error"]["request_id"], header);
}

fn assert_error_body(response: &common::TestResponse, code: u16) {
    let error = &response.body["error"];
    assert_eq!(error["code"], code, "{}", response.body);
    assert!(error["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(error["request_id"].as_str().is_some_and(|id| !id.is_empty()));
}
