//! Mapper errors
//!
//! Error codes:
//! - AERO_INVALID_ARGUMENT
//! - AERO_DEPTH_EXCEEDED
//! - AERO_NOT_A_DOCUMENT
//! - AERO_CUSTOM_SERIALIZER
//! - AERO_UNKNOWN_TYPE
//! - AERO_TYPE_MISMATCH
//! - AERO_CONFIG_INVALID
//!
//! None of these are fatal: each aborts one mapping call only.

use std::io;

use thiserror::Error;

use crate::document::DocValue;

/// Error raised by a user-supplied serializer, passed through untouched
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for mapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Mapper errors
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Max serialization depth of {max} exceeded at type {type_name}")]
    DepthExceeded { type_name: &'static str, max: usize },

    #[error("Root value serialized to {0}, not a document")]
    NotADocument(&'static str),

    #[error(transparent)]
    Custom(BoxError),

    #[error("Unknown type discriminator: {0}")]
    UnknownType(String),

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl MapperError {
    /// Mismatch between the expected kind and the stored value
    pub fn type_mismatch(expected: &'static str, found: &DocValue) -> Self {
        MapperError::TypeMismatch {
            path: String::new(),
            expected,
            found: found.type_name(),
        }
    }

    /// Prefixes the path of a mismatch with the field it occurred under
    pub fn at(self, field: &str) -> Self {
        match self {
            MapperError::TypeMismatch {
                path,
                expected,
                found,
            } => MapperError::TypeMismatch {
                path: if path.is_empty() {
                    field.to_string()
                } else {
                    format!("{}.{}", field, path)
                },
                expected,
                found,
            },
            other => other,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MapperError::InvalidArgument(_) => "AERO_INVALID_ARGUMENT",
            MapperError::DepthExceeded { .. } => "AERO_DEPTH_EXCEEDED",
            MapperError::NotADocument(_) => "AERO_NOT_A_DOCUMENT",
            MapperError::Custom(_) => "AERO_CUSTOM_SERIALIZER",
            MapperError::UnknownType(_) => "AERO_UNKNOWN_TYPE",
            MapperError::TypeMismatch { .. } => "AERO_TYPE_MISMATCH",
            MapperError::ConfigIo { .. } | MapperError::ConfigParse(_) => "AERO_CONFIG_INVALID",
        }
    }

    /// Mapper errors never indicate corrupted state
    pub fn is_fatal(&self) -> bool {
        false
    }
}
