use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crisistruth_common::{CategoryTable, ClaimVerification, FlaggedClaim, ImpactSource};
use crisistruth_store::ClaimStore;
use fact_checker_client::FactChecker;

/// Label stored when the service answers without a verdict.
const MISSING_VERDICT_LABEL: &str = "Unverifiable";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerifyStats {
    pub attempted: u32,
    pub verified: u32,
    pub failed: u32,
}

impl std::fmt::Display for VerifyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted={} verified={} failed={}",
            self.attempted, self.verified, self.failed
        )
    }
}

/// Runs unverified flagged claims through the fact checker and fills in their
/// verification fields in place.
pub struct BulkVerifier {
    claims: ClaimStore,
    checker: Arc<dyn FactChecker>,
    categories: Arc<CategoryTable>,
    impact: Arc<dyn ImpactSource>,
}

impl BulkVerifier {
    pub fn new(
        claims: ClaimStore,
        checker: Arc<dyn FactChecker>,
        categories: Arc<CategoryTable>,
        impact: Arc<dyn ImpactSource>,
    ) -> Self {
        Self {
            claims,
            checker,
            categories,
            impact,
        }
    }

    /// Verify up to `limit` pending claims, oldest first. A claim whose check fails
    /// stays unverified and is picked up again on a later run.
    pub async fn verify_pending(&self, limit: u32) -> Result<VerifyStats> {
        let mut session = self.claims.open_for_write().await?;
        let pending = session.pending(limit).await?;
        let mut stats = VerifyStats::default();

        for claim in &pending {
            stats.attempted += 1;
            let verification = match self.verify(claim).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(claim_id = claim.id, error = %e, "Claim verification failed");
                    stats.failed += 1;
                    continue;
                }
            };
            if session.apply_verification(claim.id, &verification).await? {
                stats.verified += 1;
            }
        }

        session.close().await?;
        info!(%stats, "Bulk verification finished");
        Ok(stats)
    }

    async fn verify(&self, claim: &FlaggedClaim) -> Result<ClaimVerification> {
        let check = self.checker.check_fact(&claim.claim_text).await?;
        Ok(ClaimVerification {
            raw_label: check
                .verdict()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(MISSING_VERDICT_LABEL)
                .to_string(),
            real_evidence: check.evidence(),
            verdict_score: check.verdict_score(),
            category: self.categories.category_for(&claim.claim_text).to_string(),
            impact: self.impact.draw(),
        })
    }
}
