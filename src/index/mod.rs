//! Index access subsystem for aerodoc
//!
//! The query engine consumes indexes only through the [`IndexService`]
//! facade: enumerate entries of one index in key order, each entry pointing
//! at a document location.
//!
//! # Design Principles
//!
//! - Deterministic: BTreeMap iteration order, sorted locations per key
//! - Snapshot per traversal: entries are materialized under a read lock
//! - Set identity is the document location, never the key
//!
//! [`MemoryStore`] is the in-process implementation used by embedders and tests.

mod btree;
mod errors;
mod memory;
mod service;

pub use btree::{IndexKey, IndexTree};
pub use errors::{IndexError, IndexErrorCode, IndexResult, Severity};
pub use memory::MemoryStore;
pub use service::{
    CollectionHandle, DocumentLocation, IndexDescriptor, IndexEntries, IndexEntry, IndexService,
};
