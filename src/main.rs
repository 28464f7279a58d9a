use stock_insight::config::Settings;
use stock_insight::{create_app, jobs, AppState};

#[tokio::main]
async fn main() {
    // Load .env (if present) so secrets from file are visible
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();
    let state = AppState::initialize(&settings).expect("failed to initialize application state");

    // Run the daily refresh loop on the same runtime as the server; it
    // sleeps until the configured time of day and exits cleanly on ctrl-c.
    let job_state = state.clone();
    tokio::spawn(async move {
        jobs::run_daily_loop(job_state).await;
    });

    let bind_addr = settings.bind_addr.clone();
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}
