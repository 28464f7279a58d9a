use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::models::BaseResponse;
use crate::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = BaseResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!(
        service = %state.settings.app_name,
        version = %state.settings.version,
        "health check"
    );

    Json(BaseResponse::ok(
        json!({
            "status": "healthy",
            "service": state.settings.app_name,
            "version": state.settings.version,
            "provider_status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
        }),
        "服务运行正常",
    ))
}

/// Version information
#[utoipa::path(
    get,
    path = "/api/v1/version",
    responses(
        (status = 200, description = "Version information", body = BaseResponse)
    )
)]
pub async fn get_version(State(state): State<AppState>) -> impl IntoResponse {
    Json(BaseResponse::ok(
        json!({
            "version": state.settings.version,
            "app_name": state.settings.app_name,
            "build_time": Utc::now().to_rfc3339(),
            "features": ["股票公告获取", "AI智能总结", "微信订阅", "定时刷新"],
        }),
        "版本信息获取成功",
    ))
}
