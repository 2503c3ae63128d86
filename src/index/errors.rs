//! Index error types
//!
//! Error codes:
//! - AERO_UNKNOWN_COLLECTION (ERROR)
//! - AERO_UNIQUE_VIOLATION (REJECT)
//! - AERO_INVALID_ID (REJECT)

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected, store unchanged
    Reject,
    /// Operation failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Collection was never created
    AeroUnknownCollection,
    /// Unique index already holds the key
    AeroUniqueViolation,
    /// `_id` value has no index key
    AeroInvalidId,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::AeroUnknownCollection => "AERO_UNKNOWN_COLLECTION",
            IndexErrorCode::AeroUniqueViolation => "AERO_UNIQUE_VIOLATION",
            IndexErrorCode::AeroInvalidId => "AERO_INVALID_ID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexErrorCode::AeroUnknownCollection => Severity::Error,
            IndexErrorCode::AeroUniqueViolation | IndexErrorCode::AeroInvalidId => Severity::Reject,
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
}

impl IndexError {
    /// Create an unknown collection error
    pub fn unknown_collection(collection: &str) -> Self {
        Self {
            code: IndexErrorCode::AeroUnknownCollection,
            message: format!("Collection '{}' does not exist", collection),
        }
    }

    /// Create a unique violation error
    pub fn unique_violation(index: &str, key: impl fmt::Debug) -> Self {
        Self {
            code: IndexErrorCode::AeroUniqueViolation,
            message: format!("Index '{}' already contains key {:?}", index, key),
        }
    }

    /// Create an invalid `_id` error
    pub fn invalid_id(found: &str) -> Self {
        Self {
            code: IndexErrorCode::AeroInvalidId,
            message: format!("Document _id cannot be of type {}", found),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
