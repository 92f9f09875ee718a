//! HTTP surface: single-claim verification, the two feeds, and the dashboard.

pub mod error;
pub mod records;
pub mod rest;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crisistruth_common::{CategoryTable, Config, ImpactSource};
use crisistruth_store::{ClaimStore, NewsStore, StoreLocation};
use fact_checker_client::FactChecker;

pub use error::ApiError;

pub struct AppState {
    pub news: NewsStore,
    pub claims: ClaimStore,
    /// `None` when the verification service failed to initialize at startup.
    pub fact_checker: Option<Arc<dyn FactChecker>>,
    pub categories: Arc<CategoryTable>,
    pub impact: Arc<dyn ImpactSource>,
}

impl AppState {
    pub fn from_config(
        config: &Config,
        fact_checker: Option<Arc<dyn FactChecker>>,
        categories: Arc<CategoryTable>,
        impact: Arc<dyn ImpactSource>,
    ) -> Self {
        Self {
            news: NewsStore::new(StoreLocation::new(
                config.news_db_path.clone(),
                config.store_busy_timeout,
            )),
            claims: ClaimStore::new(StoreLocation::new(
                config.claims_db_path.clone(),
                config.store_busy_timeout,
            )),
            fact_checker,
            categories,
            impact,
        }
    }
}

/// Build the full router. `allowed_origin` is the one client origin accepted for
/// cross-origin requests; credentials are allowed for it.
pub fn build_router(state: Arc<AppState>, allowed_origin: &str) -> anyhow::Result<Router> {
    let origin: HeaderValue = allowed_origin.parse()?;

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/verify", post(rest::verify::api_verify))
        .route("/real-news", get(rest::api_real_news))
        .route("/fake-news", get(rest::api_fake_news))
        .route("/dashboard-stats", get(rest::api_dashboard_stats))
        .with_state(state)
        // CORS: one origin with credentials, so methods and headers are mirrored
        // rather than wildcarded.
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true),
        )
        // Feeds are snapshots; never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    Ok(app)
}
