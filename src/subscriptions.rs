use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use crate::db::Database;
use crate::models::normalize_stock_code;

/// Per-user subscription management. Add/remove are idempotent and reply
/// with the exact user-facing message the chat front end sends back.
pub struct SubscriptionStore {
    db: Arc<Database>,
}

impl SubscriptionStore {
    pub fn new(db: Arc<Database>) -> Self {
        SubscriptionStore { db }
    }

    pub fn add_code(&self, from_user: &str, code: &str) -> Result<String> {
        let Some(code) = normalize_stock_code(code) else {
            return Ok("股票代码格式不正确，应为6位数字".to_string());
        };

        let mut codes = self.db.subscribed_codes(from_user)?;
        if codes.contains(&code) {
            return Ok(format!("{} 已在订阅列表", code));
        }
        codes.insert(code.clone());
        self.db
            .replace_codes(from_user, &codes, &Utc::now().to_rfc3339())?;
        Ok(format!("已订阅 {}", code))
    }

    pub fn del_code(&self, from_user: &str, code: &str) -> Result<String> {
        let Some(code) = normalize_stock_code(code) else {
            return Ok("股票代码格式不正确，应为6位数字".to_string());
        };

        let mut codes = self.db.subscribed_codes(from_user)?;
        if !codes.remove(&code) {
            return Ok(format!("{} 不在订阅列表", code));
        }
        self.db
            .replace_codes(from_user, &codes, &Utc::now().to_rfc3339())?;
        Ok(format!("已取消订阅 {}", code))
    }

    /// Sorted subscription list for one user.
    pub fn list_codes(&self, from_user: &str) -> Result<Vec<String>> {
        Ok(self.db.subscribed_codes(from_user)?.into_iter().collect())
    }

    /// Every `(subscriber, codes)` row; read-only, consumed by the scheduler.
    pub fn all_rows(&self) -> Result<Vec<(String, Vec<String>)>> {
        self.db.all_subscription_rows()
    }
}
