use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use utoipa::OpenApi;
// Conditionally import SwaggerUi only when needed (not test)
#[cfg(not(test))]
use utoipa_swagger_ui::SwaggerUi;
// Conditionally import CORS only when needed (not test)
#[cfg(not(test))]
use tower_http::cors::{Any, CorsLayer};
// Conditionally import Governor only when needed (not test)
#[cfg(not(test))]
use std::num::NonZeroU32;
#[cfg(not(test))]
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

pub mod cache;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod provider;
pub mod routes;
pub mod subscriptions;
pub mod summarize;

use cache::SummaryCache;
use config::Settings;
use cooldown::RefreshThrottle;
use db::Database;
use extract::{ContentExtractor, PageContentExtractor};
use fetcher::AnnouncementFetcher;
use llm::{Condenser, QwenCondenser};
use provider::EastmoneyNotices;
use subscriptions::SubscriptionStore;
use summarize::Summarizer;

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub summarizer: Arc<Summarizer>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub cache: Arc<SummaryCache>,
    pub throttle: Arc<RefreshThrottle>,
}

impl AppState {
    /// Wire up the production component graph from settings. Construction
    /// touches the filesystem (SQLite + summaries dir) but never the
    /// network.
    pub fn initialize(settings: &Settings) -> anyhow::Result<Self> {
        let db = Arc::new(Database::new(&settings.data_dir)?);
        let subscriptions = Arc::new(SubscriptionStore::new(db.clone()));
        let cache = Arc::new(SummaryCache::new(db, &settings.data_dir)?);

        let provider = Arc::new(EastmoneyNotices::new()?);
        let fetcher = AnnouncementFetcher::new(provider, settings.window_days);
        let extractor: Arc<dyn ContentExtractor> =
            Arc::new(PageContentExtractor::new(settings.pdf_max_chars)?);
        let condenser: Arc<dyn Condenser> = Arc::new(QwenCondenser::new(
            &settings.llm_base_url,
            &settings.llm_api_key,
            &settings.llm_model,
        )?);
        let summarizer = Arc::new(Summarizer::new(
            fetcher,
            extractor,
            condenser,
            settings.window_days,
            &settings.llm_model,
        ));

        let throttle = Arc::new(RefreshThrottle::new(Duration::from_secs(
            settings.refresh_cooldown_secs,
        )));

        Ok(AppState {
            settings: settings.clone(),
            summarizer,
            subscriptions,
            cache,
            throttle,
        })
    }
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner")
    )
)]
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": state.settings.app_name,
        "docs": "/docs",
        "version": state.settings.version,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "股票公告信息API服务",
        version = "0.1.0",
        description = "Stock announcement retrieval and AI summarization"
    ),
    paths(
        root,
        routes::announcements::get_stock_announcements,
        routes::announcements::summarize_announcements,
        routes::system::health_check,
        routes::system::get_version
    ),
    components(schemas(
        models::BaseResponse,
        models::Announcement,
        models::AnnouncementList,
        models::SummaryResult,
        models::ModelInfo
    ))
)]
struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // Build our API documentation (needed regardless for ApiDoc::openapi())
    let api_doc = ApiDoc::openapi();

    // --- Define API routes separately ---
    let api_routes: Router<AppState> = Router::new()
        .route(
            "/api/v1/announcements/{stock_code}",
            get(routes::announcements::get_stock_announcements),
        )
        .route(
            "/api/v1/announcements/{stock_code}/sum",
            post(routes::announcements::summarize_announcements),
        )
        .route("/api/v1/health", get(routes::system::health_check))
        .route("/api/v1/version", get(routes::system::get_version));

    // The webhook is exempt from IP rate limiting: all traffic arrives from
    // WeChat's servers and the per-code refresh cooldown throttles the only
    // expensive command.
    let wechat_routes: Router<AppState> = Router::new().route(
        "/wechat/callback",
        get(routes::wechat::wechat_verify).post(routes::wechat::wechat_message),
    );

    // --- Conditionally apply layers and Swagger UI only when NOT running tests ---
    #[cfg(not(test))]
    let (docs_router, rate_limited_api_routes) = {
        let docs_router: Router<AppState> =
            SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc).into();

        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .key_extractor(SmartIpKeyExtractor)
                .period(std::time::Duration::from_secs(60))
                .burst_size(NonZeroU32::new(30).unwrap().into())
                .finish()
                .unwrap(),
        );
        let rate_limited_api_routes = api_routes.layer(GovernorLayer {
            config: governor_conf,
        });

        (docs_router, rate_limited_api_routes)
    };

    // For test builds, use the original api_routes and an empty router for docs
    #[cfg(test)]
    let (docs_router, rate_limited_api_routes) = {
        let _ = api_doc;
        (Router::new(), api_routes)
    };

    // --- Build the final application router ---
    #[allow(unused_mut)]
    let mut app = Router::new()
        .route("/", get(root))
        .merge(rate_limited_api_routes)
        .merge(wechat_routes)
        .merge(docs_router);

    // --- Apply CORS to the whole app if needed ---
    #[cfg(not(test))]
    {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.with_state(state)
}
