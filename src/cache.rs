use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::db::Database;
use crate::error::AppError;
use crate::models::SummaryResult;

/// Latest structured summary per stock code, on durable storage.
///
/// The payload lives as one JSON file per code (overwrite semantics, no
/// history); the last-updated timestamp lives in a SQLite index so batch
/// timestamp lookups never read payload bodies. The payload write and the
/// timestamp update are not atomic with each other; a reader observing a
/// fresh timestamp during a payload write is an accepted race.
pub struct SummaryCache {
    db: Arc<Database>,
    dir: PathBuf,
}

impl SummaryCache {
    pub fn new(db: Arc<Database>, data_dir: &std::path::Path) -> anyhow::Result<Self> {
        let dir = data_dir.join("summaries");
        fs::create_dir_all(&dir)?;
        Ok(SummaryCache { db, dir })
    }

    pub fn summary_path(&self, stock_code: &str) -> PathBuf {
        self.dir.join(format!("{}.json", stock_code))
    }

    pub fn save(&self, stock_code: &str, result: &SummaryResult) -> Result<(), AppError> {
        let payload = serde_json::to_string_pretty(result)
            .map_err(|e| AppError::CacheWriteFailed(e.to_string()))?;
        fs::write(self.summary_path(stock_code), payload)
            .map_err(|e| AppError::CacheWriteFailed(e.to_string()))?;

        self.db
            .touch_summary(stock_code, &Utc::now().to_rfc3339())
            .map_err(|e| AppError::CacheWriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Best-effort narrative text from the stored payload: `content`, else
    /// `summary`, else empty. Missing or unreadable entries are empty.
    pub fn load_text(&self, stock_code: &str) -> String {
        let path = self.summary_path(stock_code);
        let Ok(raw) = fs::read_to_string(path) else {
            return String::new();
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => {
                let content = value["content"].as_str().unwrap_or("");
                if !content.is_empty() {
                    return content.to_string();
                }
                value["summary"].as_str().unwrap_or("").to_string()
            }
            Err(_) => String::new(),
        }
    }

    /// `code -> last-updated UTC ISO-8601` for the requested codes; codes
    /// never refreshed are absent from the map.
    pub fn get_timestamps(&self, codes: &[String]) -> HashMap<String, String> {
        self.db.summary_timestamps(codes).unwrap_or_else(|e| {
            tracing::error!(error = %e, "summary timestamp lookup failed");
            HashMap::new()
        })
    }
}
