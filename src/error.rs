//! Error types for Rapport Pulse

use thiserror::Error;

/// Errors raised at the crate's boundaries (parsing, config, storage).
///
/// The scoring core itself is infallible; these only surface from code that
/// touches JSON, files, or caller-supplied collaborators.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Failed to parse contact payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Contact source unavailable: {0}")]
    SourceUnavailable(String),
}
