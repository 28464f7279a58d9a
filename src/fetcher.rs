use chrono::{Days, Local};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Announcement, AnnouncementList};
use crate::provider::NoticeProvider;

/// Date-windowed announcement retrieval for one stock code.
///
/// Iterates calendar days from today backward through the configured window,
/// queries the provider once per day, filters rows to the requested code,
/// and deduplicates the accumulated list. A single failed day is logged and
/// skipped; the fetch only fails when every day in the window failed.
pub struct AnnouncementFetcher {
    provider: Arc<dyn NoticeProvider>,
    window_days: u32,
}

impl AnnouncementFetcher {
    pub fn new(provider: Arc<dyn NoticeProvider>, window_days: u32) -> Self {
        AnnouncementFetcher {
            provider,
            window_days: window_days.max(1),
        }
    }

    #[tracing::instrument(skip(self), fields(stock_code = %stock_code))]
    pub async fn fetch(&self, stock_code: &str) -> Result<AnnouncementList, AppError> {
        let today = Local::now().date_naive();
        let mut announcements: Vec<Announcement> = Vec::new();
        let mut failed_days = 0u32;

        for offset in 0..self.window_days {
            let Some(date) = today.checked_sub_days(Days::new(offset as u64)) else {
                continue;
            };

            match self.provider.query_notices(date).await {
                Ok(rows) => {
                    let before = announcements.len();
                    for row in rows.into_iter().filter(|r| r.stock_code == stock_code) {
                        let publish_date = normalize_publish_date(&row.publish_date);
                        announcements.push(Announcement {
                            id: format!(
                                "{}_{}_{}",
                                stock_code,
                                announcements.len(),
                                publish_date
                            ),
                            stock_code: stock_code.to_string(),
                            stock_name: row.stock_name,
                            title: row.title,
                            publish_date,
                            category: row.category.unwrap_or_else(|| "其他".to_string()),
                            url: row.url,
                        });
                    }
                    tracing::info!(
                        date = %date,
                        matched = announcements.len() - before,
                        "notice query finished"
                    );
                }
                Err(e) => {
                    tracing::warn!(date = %date, error = %e, "notice query failed, skipping day");
                    failed_days += 1;
                }
            }
        }

        // Every day errored: the provider is unreachable, which is distinct
        // from a window that legitimately holds zero announcements.
        if failed_days == self.window_days {
            return Err(AppError::FetchFailed(format!(
                "{} 全部 {} 天查询失败",
                stock_code, self.window_days
            )));
        }

        let unique = dedup_announcements(announcements);
        let total = unique.len();

        tracing::info!(total, "announcements fetched and deduplicated");

        Ok(AnnouncementList {
            announcements: unique,
            total,
            page: 1,
            size: total,
        })
    }
}

/// Drop later duplicates keyed on `(url, title)`; first occurrence wins.
pub fn dedup_announcements(announcements: Vec<Announcement>) -> Vec<Announcement> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    announcements
        .into_iter()
        .filter(|a| seen.insert((a.url.clone().unwrap_or_default(), a.title.clone())))
        .collect()
}

/// Normalize a provider publish date to YYYY-MM-DD.
///
/// Accepts compact `YYYYMMDD`, already-normalized dates, and dates with a
/// trailing time component. Anything unparseable falls back to today.
pub fn normalize_publish_date(raw: &str) -> String {
    let raw = raw.trim();

    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..8]);
    }

    if raw.contains('-') {
        if let Some(date_part) = raw.split(' ').next() {
            if !date_part.is_empty() {
                return date_part.to_string();
            }
        }
    }

    Local::now().format("%Y-%m-%d").to_string()
}
