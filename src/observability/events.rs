//! Observability events for aerodoc
//!
//! Every tracing event emitted by the crate carries one of these names in
//! its `event` field, so log consumers can match on a closed vocabulary.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Mapper configuration loaded from disk
    ConfigLoaded,

    // Query operations
    /// Query execution begins
    QueryReceived,
    /// A leaf could not use an index and fell back to a document scan
    QueryModeFallback,
    /// Query executed successfully
    QueryExecuted,

    // Mapper operations
    /// Type descriptor built and cached
    DescriptorCached,
    /// Serialization aborted by the depth ceiling
    SerializeDepthExceeded,
    /// Custom serializer returned an error
    CustomSerializerFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::QueryModeFallback => "QUERY_MODE_FALLBACK",
            Event::QueryExecuted => "QUERY_COMPLETE",

            Event::DescriptorCached => "DESCRIPTOR_CACHED",
            Event::SerializeDepthExceeded => "SERIALIZE_DEPTH_EXCEEDED",
            Event::CustomSerializerFailed => "CUSTOM_SERIALIZER_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
