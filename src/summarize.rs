use std::sync::Arc;

use crate::error::AppError;
use crate::extract::ContentExtractor;
use crate::fetcher::AnnouncementFetcher;
use crate::llm::{Condenser, PROVIDER_LABEL};
use crate::models::{AnnouncementList, ModelInfo, SummaryResult};

/// Hard cap on the aggregate narrative, in characters.
const MAX_SUMMARY_CHARS: usize = 500;

/// Announcement summarization engine.
///
/// Per invocation the steps run in fixed order: fetch the window, extract
/// and condense each announcement into a one-line digest entry, condense the
/// whole digest into the aggregate narrative, assemble the result.
/// Extraction failures degrade to missing digest lines; a condensation
/// failure aborts the whole call, so callers get either a complete
/// [`SummaryResult`] or a single typed failure, never a partial digest.
pub struct Summarizer {
    fetcher: AnnouncementFetcher,
    extractor: Arc<dyn ContentExtractor>,
    condenser: Arc<dyn Condenser>,
    window_days: u32,
    model: String,
}

impl Summarizer {
    pub fn new(
        fetcher: AnnouncementFetcher,
        extractor: Arc<dyn ContentExtractor>,
        condenser: Arc<dyn Condenser>,
        window_days: u32,
        model: &str,
    ) -> Self {
        Summarizer {
            fetcher,
            extractor,
            condenser,
            window_days,
            model: model.to_string(),
        }
    }

    /// The deduplicated announcement window for one code, unsummarized.
    pub async fn fetch_window(&self, stock_code: &str) -> Result<AnnouncementList, AppError> {
        self.fetcher.fetch(stock_code).await
    }

    #[tracing::instrument(skip(self), fields(stock_code = %stock_code))]
    pub async fn summarize(&self, stock_code: &str) -> Result<SummaryResult, AppError> {
        match self.run(stock_code).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(error = %e, "summarization failed");
                Err(AppError::SummarizeFailed {
                    code: stock_code.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn run(&self, stock_code: &str) -> anyhow::Result<SummaryResult> {
        let list = self.fetcher.fetch(stock_code).await?;

        if list.announcements.is_empty() {
            tracing::info!("no announcements in window");
            return Ok(SummaryResult {
                summary: format!("股票{}近{}天无公告", stock_code, self.window_days),
                content: String::new(),
                word_count: 0,
                model_info: self.model_info(),
            });
        }

        let mut digest_lines: Vec<String> = Vec::new();
        for announcement in &list.announcements {
            let Some(url) = announcement.url.as_deref() else {
                continue;
            };

            let text = self.extractor.extract(url).await;
            if text.is_empty() {
                // No content for this item; the digest is shorter, not padded.
                continue;
            }

            let line = self.condenser.condense(&text).await?;
            if !line.is_empty() {
                digest_lines.push(line);
            }
        }

        let digest = digest_lines.join("\n");
        let aggregate = if digest.is_empty() {
            String::new()
        } else {
            self.condenser.condense(&digest).await?
        };

        let content: String = aggregate.chars().take(MAX_SUMMARY_CHARS).collect();
        let word_count = content.chars().count();

        tracing::info!(
            announcements = list.total,
            digested = digest_lines.len(),
            word_count,
            "summary assembled"
        );

        Ok(SummaryResult {
            summary: format!("针对股票：{}的公告总结", stock_code),
            content,
            word_count,
            model_info: self.model_info(),
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model: self.model.clone(),
            provider: PROVIDER_LABEL.to_string(),
            status: "已生成".to_string(),
        }
    }
}
