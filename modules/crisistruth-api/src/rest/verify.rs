use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crisistruth_common::{normalize_realtime_verdict, rewrite_explanation, RealtimeVerdict};

use crate::{ApiError, AppState};

#[derive(Deserialize)]
pub struct VerifyRequest {
    claim: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verdict: RealtimeVerdict,
    pub reasoning: String,
    pub scores: BTreeMap<String, serde_json::Value>,
}

/// Check one claim against the verification service. Fails with 503 before
/// touching anything else when the service never initialized. Body errors use
/// the same `{"detail": ...}` shape as every other failure.
pub async fn api_verify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Some(checker) = state.fact_checker.as_ref() else {
        return Err(ApiError::ServiceUnavailable(
            "Fact checker is not available yet.".into(),
        ));
    };

    let Json(body) = body?;

    let check = checker.check_fact(&body.claim).await?;
    let verdict = normalize_realtime_verdict(check.verdict());
    info!(%verdict, raw = check.verdict().unwrap_or("<none>"), "Claim verified");

    Ok(Json(VerifyResponse {
        verdict,
        reasoning: rewrite_explanation(&check.summary),
        scores: check.scores,
    }))
}
