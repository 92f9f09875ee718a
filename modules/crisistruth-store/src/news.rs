use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

use crisistruth_common::{NewVerifiedItem, VerifiedItem};

use crate::error::Result;
use crate::location::StoreLocation;
use crate::{schema, time};

type NewsRow = (
    i64,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    String,
);

const NEWS_COLUMNS: &str = "id, title, summary, url, source, image_url, scraped_at";

/// The Verified Item store (`news` table).
#[derive(Debug, Clone)]
pub struct NewsStore {
    location: StoreLocation,
}

impl NewsStore {
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Open a read session. Fails with `NotFound` if the store was never created.
    pub async fn open(&self) -> Result<NewsSession> {
        Ok(NewsSession {
            conn: self.location.connect().await?,
        })
    }

    /// Open a session for collectors, creating the store and schema if missing.
    pub async fn open_for_write(&self) -> Result<NewsSession> {
        let mut conn = self.location.connect_or_create().await?;
        schema::ensure_news(&mut conn).await?;
        Ok(NewsSession { conn })
    }
}

/// One scoped connection to the news store.
pub struct NewsSession {
    conn: SqliteConnection,
}

impl NewsSession {
    /// Most recent items by `scraped_at`, newest first. Ordered on the parsed
    /// instant, since older rows use a different text format than new ones.
    pub async fn recent(&mut self, limit: u32) -> Result<Vec<VerifiedItem>> {
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news ORDER BY julianday(scraped_at) DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    pub async fn count(&mut self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&mut self.conn)
            .await?)
    }

    /// Items inserted after `after_id`, oldest first. Drives incremental index sync.
    pub async fn inserted_after(&mut self, after_id: i64, limit: u32) -> Result<Vec<VerifiedItem>> {
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news WHERE id > ? ORDER BY id ASC LIMIT ?"
        ))
        .bind(after_id)
        .bind(i64::from(limit))
        .fetch_all(&mut self.conn)
        .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    /// Insert items, skipping any whose url is already stored. Returns the number inserted.
    pub async fn insert_many(&mut self, items: &[NewVerifiedItem]) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let mut inserted = 0;
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO news (title, summary, url, source, image_url, scraped_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.title)
            .bind(&item.summary)
            .bind(&item.source_url)
            .bind(&item.source_name)
            .bind(&item.image_url)
            .bind(time::encode(item.scraped_at))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn row_to_item(row: NewsRow) -> Result<VerifiedItem> {
    let (id, title, summary, source_url, source_name, image_url, scraped_at) = row;
    Ok(VerifiedItem {
        id,
        title,
        summary,
        source_url,
        source_name,
        image_url,
        scraped_at: time::decode(&scraped_at)?,
    })
}
