mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use stock_insight::create_app;

#[tokio::test]
async fn test_root_banner() {
    let (state, _dir) = common::test_state();
    let app = create_app(state);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["message"], "股票公告信息API服务");
    assert_eq!(json["docs"], "/docs");
    assert_eq!(json["version"], "0.1.0");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_health_check() {
    let (state, _dir) = common::test_state();
    let app = create_app(state);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-forwarded-for", "127.0.0.1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["provider_status"], "healthy");
}

#[tokio::test]
async fn test_version_info() {
    let (state, _dir) = common::test_state();
    let app = create_app(state);

    let request = Request::builder()
        .uri("/api/v1/version")
        .header("x-forwarded-for", "127.0.0.1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["version"], "0.1.0");
    assert!(json["data"]["features"].is_array());
}

#[tokio::test]
async fn test_announcements_rejects_malformed_code() {
    let (state, _dir) = common::test_state();
    let app = create_app(state);

    let request = Request::builder()
        .uri("/api/v1/announcements/12AB")
        .header("x-forwarded-for", "127.0.0.1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "INVALID_STOCK_CODE");
}

#[tokio::test]
async fn test_summarize_rejects_malformed_code() {
    let (state, _dir) = common::test_state();
    let app = create_app(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/announcements/600/sum")
        .header("x-forwarded-for", "127.0.0.1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["error"]["code"], "INVALID_STOCK_CODE");
}
