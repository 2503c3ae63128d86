//! Result types for query execution

use crate::document::{DocValue, Document};
use crate::index::DocumentLocation;
use crate::query::QueryMode;

/// A single document in the result set
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDocument {
    /// Where the document is stored
    pub location: DocumentLocation,
    /// Document body
    pub document: Document,
}

impl ResultDocument {
    /// Creates a new result document
    pub fn new(location: DocumentLocation, document: Document) -> Self {
        Self { location, document }
    }

    /// Returns the `_id` value
    pub fn id(&self) -> Option<&DocValue> {
        self.document.id()
    }
}

/// Result of query execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Strategy the query resolved to
    pub mode: QueryMode,
    /// Documents in result order
    pub documents: Vec<ResultDocument>,
    /// Number of candidate documents loaded
    pub scanned_count: usize,
    /// Number of documents returned
    pub returned_count: usize,
}

impl ExecutionResult {
    /// Creates an empty result
    pub fn empty(mode: QueryMode) -> Self {
        Self {
            mode,
            documents: Vec::new(),
            scanned_count: 0,
            returned_count: 0,
        }
    }

    /// Returns true if no documents matched
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the number of results
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns an iterator over the documents
    pub fn iter(&self) -> impl Iterator<Item = &ResultDocument> {
        self.documents.iter()
    }

    /// Locations of the returned documents, in result order
    pub fn locations(&self) -> Vec<DocumentLocation> {
        self.documents.iter().map(|d| d.location).collect()
    }
}
