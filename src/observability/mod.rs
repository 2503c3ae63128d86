//! Observability for aerodoc
//!
//! Structured events go through `tracing`; every event carries an
//! [`Event`] name in its `event` field. Counters live in a
//! [`MetricsRegistry`] owned by whoever drives the work (executor, mapper).
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use aerodoc::observability::{Event, MetricsRegistry};
//!
//! tracing::debug!(event = %Event::QueryModeFallback, field = "x");
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_documents_serialized();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
