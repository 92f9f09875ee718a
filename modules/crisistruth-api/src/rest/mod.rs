pub mod verify;

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use tracing::debug;

use crisistruth_store::StoreError;

use crate::records::{
    DashboardStats, FlaggedFeedRecord, Kpis, TrendingFake, TrendingReal, VerifiedFeedRecord,
};
use crate::{ApiError, AppState};

/// Row cap for both feeds.
pub const FEED_LIMIT: u32 = 50;
const TOP_PLATFORMS: u32 = 5;
const TRENDING: u32 = 3;

/// A store the pipeline has not created yet is a soft error for the feeds.
fn store_missing(e: StoreError) -> Result<Response, ApiError> {
    if e.is_not_found() {
        debug!(error = %e, "Feed requested before store exists");
        Ok(Json(serde_json::json!({ "error": "Database not found." })).into_response())
    } else {
        Err(e.into())
    }
}

pub async fn api_real_news(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let mut session = match state.news.open().await {
        Ok(session) => session,
        Err(e) => return store_missing(e),
    };
    let items = session.recent(FEED_LIMIT).await?;
    session.close().await?;

    let records: Vec<VerifiedFeedRecord> = items
        .into_iter()
        .map(|item| {
            VerifiedFeedRecord::classified(item, &state.categories, state.impact.as_ref())
        })
        .collect();
    Ok(Json(records).into_response())
}

pub async fn api_fake_news(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let mut session = match state.claims.open().await {
        Ok(session) => session,
        Err(e) => return store_missing(e),
    };
    let claims = session.recent(FEED_LIMIT).await?;
    session.close().await?;

    let records: Vec<FlaggedFeedRecord> = claims.into_iter().map(FlaggedFeedRecord::from).collect();
    Ok(Json(records).into_response())
}

/// Composite snapshot over both stores, computed fresh on every call.
pub async fn api_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let mut news = state.news.open().await?;
    let real_verified = news.count().await?;
    let trending_real = news.recent(TRENDING).await?;
    news.close().await?;

    let mut claims = state.claims.open().await?;
    let fake_detected = claims.count().await?;
    let categories = claims.category_histogram().await?;
    let platforms = claims.top_platforms(TOP_PLATFORMS).await?;
    let trending_fake = claims.top_by_score(TRENDING).await?;
    claims.close().await?;

    Ok(Json(DashboardStats {
        stats: Kpis::new(real_verified, fake_detected),
        category_distribution: categories.into_iter().map(Into::into).collect(),
        toxicity_data: platforms.into_iter().map(Into::into).collect(),
        trending_fake: trending_fake
            .into_iter()
            .enumerate()
            .map(|(i, claim)| TrendingFake::new(i + 1, claim))
            .collect(),
        trending_real: trending_real
            .into_iter()
            .enumerate()
            .map(|(i, item)| TrendingReal::new(i + 1, item))
            .collect(),
    }))
}
