//! Error types for gitrows-core

/// Raised while building the binary form of an index key or index value
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Invalid {field} hash {value:?}: expected 40 lowercase hex characters")]
    InvalidHash { field: &'static str, value: String },

    #[error("Failed to serialize index key: {0}")]
    Serialize(String),

    #[error("Failed to seal index value: {0}")]
    Envelope(String),
}

/// Raised while reading stored bytes back
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Truncated index key")]
    Truncated,

    #[error("Malformed index key: {0}")]
    Malformed(String),

    #[error("Failed to open index value: {0}")]
    Envelope(String),
}

/// Raised when values do not fit the fixed row schema
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Column {column} expects {expected}")]
    Type { column: &'static str, expected: &'static str },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}
