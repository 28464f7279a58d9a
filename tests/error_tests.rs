use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use serde_json::Value;

use stock_insight::error::AppError;

#[test]
fn test_app_error_display() {
    let error = AppError::InvalidStockCode("12AB".to_string());
    assert!(error.to_string().contains("6位数字"));
    assert!(error.to_string().contains("12AB"));

    let error = AppError::FetchFailed("provider down".to_string());
    assert!(error.to_string().contains("获取股票公告失败"));

    let error = AppError::SummarizeFailed {
        code: "600000".to_string(),
        reason: "llm timeout".to_string(),
    };
    assert!(error.to_string().contains("AI智能总结失败"));
    assert!(error.to_string().contains("600000"));

    let error = AppError::TooFrequent {
        code: "600000".to_string(),
        retry_in_secs: 42,
    };
    assert_eq!(error.to_string(), "600000 刷新过于频繁，请 42s 后再试");
}

#[test]
fn test_error_codes() {
    assert_eq!(
        AppError::FetchFailed(String::new()).code(),
        "FETCH_ANNOUNCEMENTS_ERROR"
    );
    assert_eq!(
        AppError::SummarizeFailed {
            code: String::new(),
            reason: String::new()
        }
        .code(),
        "SUMMARIZE_ERROR"
    );
    assert_eq!(
        AppError::CacheWriteFailed(String::new()).code(),
        "CACHE_WRITE_ERROR"
    );
}

#[tokio::test]
async fn test_app_error_into_response() {
    let response = AppError::InvalidStockCode("x".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_STOCK_CODE");
    assert!(body.get("timestamp").is_some());

    let response = AppError::SignatureRejected.into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = AppError::TooFrequent {
        code: "600000".to_string(),
        retry_in_secs: 10,
    }
    .into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = AppError::FetchFailed("down".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = AppError::CacheWriteFailed("disk full".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
