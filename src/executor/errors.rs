//! Executor error types
//!
//! Error codes:
//! - AERO_STORAGE_READ (ERROR)
//! - AERO_DATA_CORRUPTION (FATAL)

use thiserror::Error;

use crate::index::DocumentLocation;

/// Failures surfaced while driving a query against storage.
///
/// Query resolution itself never fails; only the document source can.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Storage collaborator could not read a candidate
    #[error("Failed to load document {location}: {reason}")]
    Storage {
        location: DocumentLocation,
        reason: String,
    },

    /// Stored bytes did not decode to a document
    #[error("Data corruption at {location}: {reason}")]
    DataCorruption {
        location: DocumentLocation,
        reason: String,
    },
}

impl ExecutorError {
    pub fn storage(location: DocumentLocation, reason: impl Into<String>) -> Self {
        ExecutorError::Storage {
            location,
            reason: reason.into(),
        }
    }

    pub fn data_corruption(location: DocumentLocation, reason: impl Into<String>) -> Self {
        ExecutorError::DataCorruption {
            location,
            reason: reason.into(),
        }
    }

    /// Stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Storage { .. } => "AERO_STORAGE_READ",
            ExecutorError::DataCorruption { .. } => "AERO_DATA_CORRUPTION",
        }
    }

    pub fn location(&self) -> DocumentLocation {
        match self {
            ExecutorError::Storage { location, .. } | ExecutorError::DataCorruption { location, .. } => *location,
        }
    }

    /// Corruption means the store can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutorError::DataCorruption { .. })
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
