/*
    errors.rs - Error types for the shared state store
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The substrate could not be reached or refused the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Snapshot file I/O
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
