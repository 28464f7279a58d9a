use std::env;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use stock_insight::config::Settings;
use stock_insight::{jobs, AppState};

/// Standalone refresh worker. With no flags it runs the daily loop; flags
/// allow one-shot runs for operations and backfills:
///   --refresh-once        refresh every subscribed code now, then exit
///   --code NNNNNN         refresh one code now, then exit
#[tokio::main]
async fn main() {
    // Initialise tracing (INFO level)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load .env (if present) so secrets from file are visible
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env();
    let state = match AppState::initialize(&settings) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to initialize worker state");
            return;
        }
    };

    let args: Vec<String> = env::args().collect();
    let run_once = args.iter().any(|a| a == "--refresh-once");
    let one_code = args
        .iter()
        .position(|a| a == "--code")
        .and_then(|i| args.get(i + 1))
        .cloned();

    if let Some(code) = one_code {
        match state.summarizer.summarize(&code).await {
            Ok(result) => {
                if let Err(e) = state.cache.save(&code, &result) {
                    error!(%code, error = %e, "summary not persisted");
                } else {
                    info!(%code, word_count = result.word_count, "summary refreshed");
                }
            }
            Err(e) => error!(%code, error = %e, "summarize failed"),
        }
        return;
    }

    if run_once {
        jobs::refresh_all(&state).await;
        return;
    }

    info!(refresh_at = %settings.refresh_at, "Worker starting; running daily refresh loop");
    jobs::run_daily_loop(state).await;
}
