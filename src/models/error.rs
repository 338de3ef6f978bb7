use std::io;

use thiserror::Error;

/// Error taxonomy for every comic operation.
///
/// `Validation` and `NotFound` carry caller-facing meaning; the remaining
/// variants are internal failures that surface as a generic 500.
#[derive(Debug, Error)]
pub enum ComicError {
    #[error("{0}")]
    Validation(String),

    #[error("Comic not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] io::Error),

    #[error("catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ComicError {
    pub fn validation(message: impl Into<String>) -> Self {
        ComicError::Validation(message.into())
    }
}
