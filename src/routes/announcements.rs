use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::models::{normalize_stock_code, BaseResponse};
use crate::AppState;

/// Announcements for one stock code over the trailing window
#[utoipa::path(
    get,
    path = "/api/v1/announcements/{stock_code}",
    params(
        ("stock_code" = String, Path, description = "6-digit A-share code")
    ),
    responses(
        (status = 200, description = "Deduplicated announcement window", body = BaseResponse),
        (status = 400, description = "Malformed stock code"),
        (status = 502, description = "Provider unreachable for the whole window")
    )
)]
#[tracing::instrument(skip(state), fields(stock_code = %stock_code))]
pub async fn get_stock_announcements(
    State(state): State<AppState>,
    Path(stock_code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let code =
        normalize_stock_code(&stock_code).ok_or(AppError::InvalidStockCode(stock_code))?;

    let list = state.summarizer.fetch_window(&code).await?;
    Ok(Json(BaseResponse::ok(list, "获取公告成功")))
}

/// Condensed AI summary of the announcement window
#[utoipa::path(
    post,
    path = "/api/v1/announcements/{stock_code}/sum",
    params(
        ("stock_code" = String, Path, description = "6-digit A-share code")
    ),
    responses(
        (status = 200, description = "Aggregate summary", body = BaseResponse),
        (status = 400, description = "Malformed stock code"),
        (status = 502, description = "Summarization failed")
    )
)]
#[tracing::instrument(skip(state), fields(stock_code = %stock_code))]
pub async fn summarize_announcements(
    State(state): State<AppState>,
    Path(stock_code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let code =
        normalize_stock_code(&stock_code).ok_or(AppError::InvalidStockCode(stock_code))?;

    let result = state.summarizer.summarize(&code).await?;
    Ok(Json(BaseResponse::ok(result, "AI总结完成")))
}
