//! Document error types
//!
//! Error codes:
//! - AERO_INVALID_JSON (REJECT)
//! - AERO_INVALID_OBJECT_ID (REJECT)

use thiserror::Error;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised while building or parsing documents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("invalid extended JSON: {0}")]
    InvalidJson(String),

    #[error("invalid object id `{0}`: expected 24 hex characters")]
    InvalidObjectId(String),
}

impl DocumentError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::InvalidJson(_) => "AERO_INVALID_JSON",
            DocumentError::InvalidObjectId(_) => "AERO_INVALID_OBJECT_ID",
        }
    }
}
