use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidStockCode(String),
    FetchFailed(String),
    SummarizeFailed { code: String, reason: String },
    CacheWriteFailed(String),
    TooFrequent { code: String, retry_in_secs: u64 },
    SignatureRejected,
    XmlParseError(String),
    InternalError(String),
}

impl AppError {
    /// Machine-readable error code carried in the response payload.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidStockCode(_) => "INVALID_STOCK_CODE",
            AppError::FetchFailed(_) => "FETCH_ANNOUNCEMENTS_ERROR",
            AppError::SummarizeFailed { .. } => "SUMMARIZE_ERROR",
            AppError::CacheWriteFailed(_) => "CACHE_WRITE_ERROR",
            AppError::TooFrequent { .. } => "REFRESH_TOO_FREQUENT",
            AppError::SignatureRejected => "SIGNATURE_REJECTED",
            AppError::XmlParseError(_) => "XML_PARSE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidStockCode(code) => {
                write!(f, "股票代码格式不正确，应为6位数字: {}", code)
            }
            AppError::FetchFailed(msg) => write!(f, "获取股票公告失败: {}", msg),
            AppError::SummarizeFailed { code, reason } => {
                write!(f, "AI智能总结失败: {}, 错误: {}", code, reason)
            }
            AppError::CacheWriteFailed(msg) => write!(f, "总结缓存写入失败: {}", msg),
            AppError::TooFrequent {
                code,
                retry_in_secs,
            } => write!(f, "{} 刷新过于频繁，请 {}s 后再试", code, retry_in_secs),
            AppError::SignatureRejected => write!(f, "签名校验失败"),
            AppError::XmlParseError(msg) => write!(f, "XML解析失败: {}", msg),
            AppError::InternalError(msg) => write!(f, "内部服务器错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidStockCode(_) | AppError::XmlParseError(_) => StatusCode::BAD_REQUEST,
            AppError::SignatureRejected => StatusCode::FORBIDDEN,
            AppError::TooFrequent { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::FetchFailed(_) | AppError::SummarizeFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::CacheWriteFailed(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            },
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}
