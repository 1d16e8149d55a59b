use thiserror::Error;

/// Errors that can occur when interacting with the durable cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to open cache: {0}")]
    OpenError(String),

    #[error("Cache operation failed: {0}")]
    OperationError(String),

    #[error("Cache is locked")]
    Locked,

    #[error("Failed to serialize records: {0}")]
    SerializeError(#[from] serde_json::Error),
}
