use thiserror::Error;

/// Errors that can occur when interacting with the remote mirror
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to connect to remote: {0}")]
    ConnectionError(String),

    #[error("Query execution failed: {0}")]
    QueryError(String),

    #[error("Failed to deserialize remote row: {0}")]
    DeserializationError(String),

    #[error("Other remote error: {0}")]
    Other(#[from] anyhow::Error),
}
