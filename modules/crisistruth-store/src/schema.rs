//! Table definitions. Only the collectors' write path bootstraps these; the read
//! paths never create a store.

use sqlx::sqlite::SqliteConnection;

use crate::error::Result;

const NEWS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS news (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    summary     TEXT,
    url         TEXT NOT NULL UNIQUE,
    source      TEXT NOT NULL,
    image_url   TEXT,
    scraped_at  TEXT NOT NULL
)
"#;

const CLAIMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS fake_claims (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    claim          TEXT NOT NULL,
    content        TEXT,
    url            TEXT NOT NULL UNIQUE,
    source         TEXT NOT NULL,
    label          TEXT,
    category       TEXT,
    impact         TEXT,
    real_evidence  TEXT,
    verdict_score  REAL
)
"#;

pub(crate) async fn ensure_news(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(NEWS_SCHEMA).execute(&mut *conn).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_scraped_at ON news (scraped_at)")
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn ensure_claims(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(CLAIMS_SCHEMA).execute(&mut *conn).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_fake_claims_label ON fake_claims (label)")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
