//! Metrics registry for aerodoc
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::query::QueryMode;

/// Metrics registry containing all operational counters
///
/// # Thread Safety
///
/// All counters use atomic operations for thread-safe increments.
/// Uses Relaxed ordering for minimal overhead.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Queries that resolved in Index mode
    queries_index_mode: AtomicU64,
    /// Queries that resolved in Document mode
    queries_document_mode: AtomicU64,
    /// Candidate documents loaded by the executor
    documents_scanned: AtomicU64,
    /// Successful `to_document` calls
    documents_serialized: AtomicU64,
    /// Serializations aborted by the depth ceiling
    depth_exceeded: AtomicU64,
    /// Descriptor lookups answered from cache
    descriptor_hits: AtomicU64,
    /// Descriptor lookups that had to build
    descriptor_misses: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Query metrics

    /// Record a completed query in its resolved mode
    pub fn record_query(&self, mode: QueryMode) {
        let counter = match mode {
            QueryMode::Index => &self.queries_index_mode,
            QueryMode::Document => &self.queries_document_mode,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the scanned document count
    pub fn add_documents_scanned(&self, count: u64) {
        self.documents_scanned.fetch_add(count, Ordering::Relaxed);
    }

    // Mapper metrics

    /// Increment documents serialized
    pub fn increment_documents_serialized(&self) {
        self.documents_serialized.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment depth failures
    pub fn increment_depth_exceeded(&self) {
        self.depth_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a descriptor cache lookup
    pub fn record_descriptor_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.descriptor_hits
        } else {
            &self.descriptor_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_index_mode: self.queries_index_mode.load(Ordering::Relaxed),
            queries_document_mode: self.queries_document_mode.load(Ordering::Relaxed),
            documents_scanned: self.documents_scanned.load(Ordering::Relaxed),
            documents_serialized: self.documents_serialized.load(Ordering::Relaxed),
            depth_exceeded: self.depth_exceeded.load(Ordering::Relaxed),
            descriptor_hits: self.descriptor_hits.load(Ordering::Relaxed),
            descriptor_misses: self.descriptor_misses.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_index_mode: u64,
    pub queries_document_mode: u64,
    pub documents_scanned: u64,
    pub documents_serialized: u64,
    pub depth_exceeded: u64,
    pub descriptor_hits: u64,
    pub descriptor_misses: u64,
}

impl MetricsSnapshot {
    /// Snapshot as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
