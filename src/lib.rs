//! aerodoc - query evaluation and object/document mapping for an embedded
//! document database
//!
//! - `document`: the value model
//! - `index`: the index access facade and an in-memory store
//! - `query`: composable predicates resolved via index or document scan
//! - `executor`: turns a resolved query into documents
//! - `mapper`: typed values to documents and back

pub mod document;
pub mod executor;
pub mod index;
pub mod mapper;
pub mod observability;
pub mod query;
