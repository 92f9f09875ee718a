use thiserror::Error;

use crisistruth_store::StoreError;

pub type Result<T> = std::result::Result<T, FactCheckError>;

#[derive(Debug, Error)]
pub enum FactCheckError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Store error during sync: {0}")]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for FactCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FactCheckError::MalformedResponse(err.to_string())
        } else {
            FactCheckError::Network(err.to_string())
        }
    }
}
