//! Error types for gitrows-db

use gitrows_core::DecodingError;

/// Failures of the index store itself
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Index database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Corrupted index metadata: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Decoding(#[from] DecodingError),
}
