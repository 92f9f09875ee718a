use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

use crisistruth_common::{ClaimVerification, FlaggedClaim, NewFlaggedClaim, DEFAULT_CATEGORY};

use crate::error::Result;
use crate::location::StoreLocation;
use crate::schema;

type ClaimRow = (
    i64,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
);

const CLAIM_COLUMNS: &str =
    "id, claim, content, url, source, label, category, impact, real_evidence, verdict_score";

/// One bucket of the dashboard category histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

/// Claim volume for one collector source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCount {
    pub platform: String,
    pub count: i64,
}

/// The Flagged Claim store (`fake_claims` table).
#[derive(Debug, Clone)]
pub struct ClaimStore {
    location: StoreLocation,
}

impl ClaimStore {
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Open a read session. Fails with `NotFound` if the store was never created.
    pub async fn open(&self) -> Result<ClaimSession> {
        Ok(ClaimSession {
            conn: self.location.connect().await?,
        })
    }

    /// Open a session for collectors and the bulk verifier, creating the store if missing.
    pub async fn open_for_write(&self) -> Result<ClaimSession> {
        let mut conn = self.location.connect_or_create().await?;
        schema::ensure_claims(&mut conn).await?;
        Ok(ClaimSession { conn })
    }
}

/// One scoped connection to the claim store.
pub struct ClaimSession {
    conn: SqliteConnection,
}

impl ClaimSession {
    /// Most recent claims by id, newest first.
    pub async fn recent(&mut self, limit: u32) -> Result<Vec<FlaggedClaim>> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM fake_claims ORDER BY id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows.into_iter().map(row_to_claim).collect())
    }

    pub async fn count(&mut self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM fake_claims")
            .fetch_one(&mut self.conn)
            .await?)
    }

    /// Claim counts per category. Uncategorized claims count toward the default category.
    pub async fn category_histogram(&mut self) -> Result<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT COALESCE(category, ?) AS name, COUNT(*) AS count
            FROM fake_claims
            GROUP BY name
            ORDER BY count DESC, name ASC
            "#,
        )
        .bind(DEFAULT_CATEGORY)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| CategoryCount { name, count })
            .collect())
    }

    /// Sources with the most claims, busiest first.
    pub async fn top_platforms(&mut self, limit: u32) -> Result<Vec<PlatformCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT source, COUNT(*) AS count
            FROM fake_claims
            GROUP BY source
            ORDER BY count DESC, source ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(platform, count)| PlatformCount { platform, count })
            .collect())
    }

    /// Highest verdict scores first; unscored claims sort last.
    pub async fn top_by_score(&mut self, limit: u32) -> Result<Vec<FlaggedClaim>> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS} FROM fake_claims
            ORDER BY verdict_score IS NULL, verdict_score DESC, id DESC
            LIMIT ?
            "#
        ))
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows.into_iter().map(row_to_claim).collect())
    }

    /// Unverified claims, oldest first.
    pub async fn pending(&mut self, limit: u32) -> Result<Vec<FlaggedClaim>> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM fake_claims WHERE label IS NULL ORDER BY id ASC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows.into_iter().map(row_to_claim).collect())
    }

    /// Insert claims as unverified, skipping urls already stored. Returns the number inserted.
    pub async fn insert_many(&mut self, claims: &[NewFlaggedClaim]) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let mut inserted = 0;
        for claim in claims {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO fake_claims (claim, content, url, source) VALUES (?, ?, ?, ?)",
            )
            .bind(&claim.claim_text)
            .bind(&claim.content)
            .bind(&claim.source_url)
            .bind(&claim.platform)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Fill the verification fields of a still-unverified claim. Returns false if the
    /// claim does not exist or was already verified.
    pub async fn apply_verification(
        &mut self,
        id: i64,
        verification: &ClaimVerification,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fake_claims
            SET label = ?, real_evidence = ?, verdict_score = ?, category = ?, impact = ?
            WHERE id = ? AND label IS NULL
            "#,
        )
        .bind(&verification.raw_label)
        .bind(&verification.real_evidence)
        .bind(verification.verdict_score)
        .bind(&verification.category)
        .bind(verification.impact.as_str())
        .bind(id)
        .execute(&mut self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn row_to_claim(row: ClaimRow) -> FlaggedClaim {
    let (
        id,
        claim_text,
        content,
        source_url,
        platform,
        raw_label,
        category,
        impact,
        real_evidence,
        verdict_score,
    ) = row;
    FlaggedClaim {
        id,
        claim_text,
        content,
        source_url,
        platform,
        raw_label,
        category,
        impact,
        real_evidence,
        verdict_score,
    }
}
