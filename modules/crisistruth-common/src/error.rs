use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrisisTruthError {
    #[error("Failed to read category table {path}: {source}")]
    CategoryTableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid category table: {0}")]
    CategoryTable(String),
}
