use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Where a store lives and how long to wait for a writer's lock.
#[derive(Debug, Clone)]
pub struct StoreLocation {
    path: PathBuf,
    busy_timeout: Duration,
}

impl StoreLocation {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Connect to an existing store. Never creates the file.
    pub(crate) async fn connect(&self) -> Result<SqliteConnection> {
        if !self.exists().await {
            return Err(StoreError::NotFound(self.path.clone()));
        }
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(false)
            .busy_timeout(self.busy_timeout);
        debug!(path = %self.path.display(), "Opening store connection");
        Ok(SqliteConnection::connect_with(&options).await?)
    }

    /// Connect for collectors, creating the file and its directory if needed.
    pub(crate) async fn connect_or_create(&self) -> Result<SqliteConnection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(self.busy_timeout);
        Ok(SqliteConnection::connect_with(&options).await?)
    }
}
