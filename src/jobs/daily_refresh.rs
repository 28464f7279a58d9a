use chrono::{Duration as ChronoDuration, FixedOffset, NaiveTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::AppState;

/// Daily refresh loop: sleep until the configured time of day (Beijing),
/// then re-run summarization for every subscribed code and write through
/// the cache. The sleep is cancelled cleanly on shutdown; a per-code
/// summarization in flight at shutdown is abandoned, not rolled back.
pub async fn run_daily_loop(state: AppState) {
    loop {
        let wait = duration_until(&state.settings.refresh_at);
        info!(
            refresh_at = %state.settings.refresh_at,
            wait_secs = wait.as_secs(),
            "daily refresh scheduled"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("daily refresh loop shutting down");
                return;
            }
        }

        refresh_all(&state).await;
    }
}

/// One full refresh pass over every subscribed code, deduplicated across
/// subscribers. A code whose summary could not be persisted is logged as a
/// failure and not counted as refreshed.
pub async fn refresh_all(state: &AppState) {
    let rows = match state.subscriptions.all_rows() {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "could not list subscriptions, skipping refresh pass");
            return;
        }
    };

    let codes: BTreeSet<String> = rows.into_iter().flat_map(|(_, codes)| codes).collect();
    info!(codes = codes.len(), "daily refresh pass started");

    let mut refreshed = 0usize;
    for code in &codes {
        match state.summarizer.summarize(code).await {
            Ok(result) => match state.cache.save(code, &result) {
                Ok(()) => {
                    refreshed += 1;
                    info!(%code, word_count = result.word_count, "summary refreshed");
                }
                Err(e) => error!(%code, error = %e, "summary refresh not persisted"),
            },
            Err(e) => warn!(%code, error = %e, "summarize failed during refresh"),
        }
    }

    info!(refreshed, total = codes.len(), "daily refresh pass finished");
}

/// Time until the next occurrence of `HH:MM` Beijing time. A malformed
/// configuration falls back to 24 hours.
pub fn duration_until(hhmm: &str) -> Duration {
    let Some(target) = parse_hhmm(hhmm) else {
        warn!(refresh_at = %hhmm, "invalid DAILY_REFRESH_AT, defaulting to 24h");
        return Duration::from_secs(24 * 3600);
    };

    let beijing = FixedOffset::east_opt(8 * 3600).unwrap();
    let now = Utc::now().with_timezone(&beijing);

    let mut next = now.date_naive().and_time(target);
    if next <= now.naive_local() {
        next = next + ChronoDuration::days(1);
    }

    let wait = next - now.naive_local();
    wait.to_std().unwrap_or(Duration::from_secs(24 * 3600))
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}
