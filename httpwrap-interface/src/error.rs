//! Error types for httpwrap transfers.

use thiserror::Error;

/// Errors a backend may report for a single transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A POST request was issued without a `content-type` header, so the form encoding cannot
    /// be chosen.
    #[error("POST request has no content-type header")]
    MissingContentType,
    /// The transfer engine reported a non-success status.
    #[error("transfer failed ({code}): {message}")]
    Transfer {
        /// Status code taken verbatim from the transfer engine.
        code: i32,
        /// Human readable description of the failure.
        message: String,
    },
}

/// Result type for httpwrap transfers.
pub type Result<T> = std::result::Result<T, Error>;
