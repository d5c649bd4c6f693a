//! Error types for the fapiao-core library.

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Malformed token or configuration JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to invoice extraction.
///
/// Everything a noisy OCR pass can produce (unknown layout, missing fields,
/// broken tables, malformed boxes) is reported as a
/// [`ParseIssue`](crate::models::invoice::ParseIssue) on the parsed document
/// instead. Only input that cannot be parsed at all ends up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The token list was empty.
    #[error("no tokens to parse")]
    EmptyInput,
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
