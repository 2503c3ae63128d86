//! Mapper configuration
//!
//! Captured by a [`DocumentMapper`](super::DocumentMapper) at build time and
//! never changed afterwards, so mappers with different settings can coexist.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::observability::Event;

use super::errors::{MapperError, MapperResult};

/// Default recursion ceiling for `serialize`
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Serialization switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Trim string values before storing them (default: true)
    #[serde(default = "default_true")]
    pub trim_whitespace: bool,

    /// Store empty strings, after trimming, as null (default: true)
    #[serde(default = "default_true")]
    pub empty_string_to_null: bool,

    /// Keep null-valued members; `_id` is always kept (default: false)
    #[serde(default)]
    pub serialize_null_values: bool,

    /// Recursion ceiling (default: 20)
    #[serde(default = "default_max_depth")]
    pub max_serialization_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            trim_whitespace: true,
            empty_string_to_null: true,
            serialize_null_values: false,
            max_serialization_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MapperConfig {
    /// Config with both string transforms disabled
    pub fn raw_strings() -> Self {
        Self {
            trim_whitespace: false,
            empty_string_to_null: false,
            ..Default::default()
        }
    }

    /// Loads a config from a JSON file; absent keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> MapperResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MapperError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: MapperConfig = serde_json::from_str(&content)?;

        info!(
            event = %Event::ConfigLoaded,
            path = %path.display(),
            max_depth = config.max_serialization_depth,
        );
        Ok(config)
    }
}
