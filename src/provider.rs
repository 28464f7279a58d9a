use async_trait::async_trait;
use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const NOTICE_API: &str = "https://np-anotice-stock.eastmoney.com/api/security/ann";
const NOTICE_PAGE_BASE: &str = "https://data.eastmoney.com/notices/detail";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One raw row from the provider's notice-report listing, before it is
/// filtered and converted into an [`crate::models::Announcement`].
#[derive(Debug, Clone)]
pub struct NoticeRow {
    pub stock_code: String,
    pub stock_name: String,
    pub title: String,
    pub publish_date: String,
    pub category: Option<String>,
    pub url: Option<String>,
}

/// Provider query interface: all notice-report rows published on one
/// calendar day, market-wide. Callers filter by stock code.
#[async_trait]
pub trait NoticeProvider: Send + Sync {
    async fn query_notices(&self, date: NaiveDate) -> anyhow::Result<Vec<NoticeRow>>;
}

/// Eastmoney notice-report client.
pub struct EastmoneyNotices {
    client: Client,
}

impl EastmoneyNotices {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(EastmoneyNotices { client })
    }

    fn day_url(date: NaiveDate) -> String {
        let day = date.format("%Y-%m-%d");
        format!(
            "{}?sr=-1&page_size=100&page_index=1&ann_type=SHA,SZA&client_source=web&f_node=0&s_node=0&begin_time={}&end_time={}",
            NOTICE_API, day, day
        )
    }
}

fn retry_notify_handler<E>(err: E, duration: Duration)
where
    E: std::fmt::Display,
{
    tracing::warn!(
        "Notice query failed: {}. Retrying in {:.1}s...",
        err,
        duration.as_secs_f32()
    );
}

#[async_trait]
impl NoticeProvider for EastmoneyNotices {
    #[tracing::instrument(skip(self), fields(date = %date))]
    async fn query_notices(&self, date: NaiveDate) -> anyhow::Result<Vec<NoticeRow>> {
        let url = Self::day_url(date);

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..ExponentialBackoff::default()
        };

        let response = retry_notify(
            backoff,
            || async {
                match self.client.get(&url).send().await {
                    Ok(resp) => {
                        let status = resp.status();
                        if status.is_success() {
                            Ok(resp)
                        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                            || status.is_server_error()
                        {
                            Err(BackoffError::transient(anyhow::anyhow!(
                                "provider returned retryable status: {}",
                                status
                            )))
                        } else {
                            Err(BackoffError::permanent(anyhow::anyhow!(
                                "provider returned non-retryable status: {}",
                                status
                            )))
                        }
                    }
                    Err(err) => {
                        if err.is_timeout() || err.is_connect() || err.is_request() {
                            Err(BackoffError::transient(anyhow::Error::new(err)))
                        } else {
                            Err(BackoffError::permanent(anyhow::Error::new(err)))
                        }
                    }
                }
            },
            retry_notify_handler,
        )
        .await?;

        let json: Value = response.json().await?;
        Ok(parse_notice_rows(&json))
    }
}

/// Pull the fields the pipeline needs out of the provider's listing JSON.
/// Rows with no usable title are dropped; everything else degrades to empty
/// strings rather than failing the whole day.
pub fn parse_notice_rows(json: &Value) -> Vec<NoticeRow> {
    let mut rows = Vec::new();

    let Some(list) = json["data"]["list"].as_array() else {
        return rows;
    };

    for item in list {
        let art_code = item["art_code"].as_str().unwrap_or("").to_string();
        let title = item["title"]
            .as_str()
            .or_else(|| item["title_ch"].as_str())
            .unwrap_or("")
            .to_string();
        if title.is_empty() {
            continue;
        }

        let publish_date = item["notice_date"].as_str().unwrap_or("").to_string();

        let (stock_code, stock_name) = item["codes"]
            .as_array()
            .and_then(|codes| codes.first())
            .map(|first| {
                (
                    first["stock_code"].as_str().unwrap_or("").to_string(),
                    first["short_name"].as_str().unwrap_or("").to_string(),
                )
            })
            .unwrap_or_default();

        let category = item["columns"]
            .as_array()
            .and_then(|cols| cols.first())
            .and_then(|c| c["column_name"].as_str())
            .map(|s| s.to_string());

        let url = if art_code.is_empty() || stock_code.is_empty() {
            None
        } else {
            Some(format!(
                "{}/{}/{}.html",
                NOTICE_PAGE_BASE, stock_code, art_code
            ))
        };

        rows.push(NoticeRow {
            stock_code,
            stock_name,
            title,
            publish_date,
            category,
            url,
        });
    }

    rows
}
