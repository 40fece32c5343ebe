use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldworkError {
    /// A query, subscribe or commit call failed at the transport layer.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// One partition of a chunked batch failed after others may have
    /// committed. `partition` is the 0-based index of the first failure.
    #[error(
        "Batch partition {partition} of {partitions} failed ({committed} committed): {message}"
    )]
    PartialBatchFailure {
        partition: usize,
        partitions: usize,
        committed: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl FieldworkError {
    /// Whether this error came from the store transport rather than from the
    /// engine itself.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            FieldworkError::StoreUnavailable(_) | FieldworkError::PartialBatchFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FieldworkError>;

// Callers that need their own error type can wrap this one:
//
// #[derive(Error, Debug)]
// pub enum AdminError {
//     #[error("Link expired: {0}")]
//     LinkExpired(String),
//
//     #[error(transparent)]
//     Fieldwork(#[from] FieldworkError),
// }
//
// and go back the other way through `FieldworkError::Other(err.into())`.
