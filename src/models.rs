use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform response envelope returned by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub message: String,
    pub timestamp: String,
}

impl BaseResponse {
    pub fn ok<T: Serialize>(data: T, message: &str) -> Self {
        BaseResponse {
            success: true,
            data: serde_json::to_value(data).ok(),
            message: message.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// One disclosure item for a stock code.
///
/// Constructed fresh per fetch and never persisted individually. The id is
/// best-effort (`{code}_{position}_{date}`) and must not be treated as a
/// stable key across repeated fetches of the same window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Announcement {
    /// Derived identifier, best-effort unique within one fetch
    pub id: String,
    /// 6-digit A-share code, no market prefix
    pub stock_code: String,
    /// Company short name as reported by the provider
    pub stock_name: String,
    /// Announcement title
    pub title: String,
    /// Publish date normalized to YYYY-MM-DD
    pub publish_date: String,
    /// Announcement category, "其他" when the provider omits it
    pub category: String,
    /// Link to the full announcement page, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Deduplicated announcements for one stock code over one fetch window.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementList {
    pub announcements: Vec<Announcement>,
    /// Count after deduplication
    pub total: usize,
    pub page: usize,
    pub size: usize,
}

/// Identifier of the model that produced a summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    pub model: String,
    pub provider: String,
    pub status: String,
}

/// Output of the summarization engine for one stock code; the unit persisted
/// by the result cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResult {
    /// Short label incorporating the stock code
    pub summary: String,
    /// Aggregate narrative, bounded length
    pub content: String,
    /// Character length of `content`
    pub word_count: usize,
    pub model_info: ModelInfo,
}

/// Validate and normalize a stock code: exactly six ASCII digits.
pub fn normalize_stock_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Some(code.to_string())
    } else {
        None
    }
}
