//! Query node contract
//!
//! A query node is a boolean predicate over documents with two evaluation
//! strategies:
//!
//! - Index: produce the matching [`IndexEntry`] stream from index traversal
//! - Document: test materialized documents with [`Query::matches_document`]
//!
//! The strategy a node ends up with is reported by [`Query::run`] and is
//! derived bottom-up. A node is Index only if every descendant is.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::document::Document;
use crate::index::{
    CollectionHandle, DocumentLocation, IndexDescriptor, IndexEntries, IndexKey, IndexService,
};
use crate::observability::Event;

/// Execution strategy a query resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Result set comes from index traversal alone
    Index,
    /// Candidates must be re-checked against full documents
    Document,
}

impl QueryMode {
    /// Mode of a node combining two children.
    ///
    /// Document wins: once one side needs full documents the index-only
    /// result of the other side cannot be trusted on its own.
    pub fn combine(self, other: QueryMode) -> QueryMode {
        match (self, other) {
            (QueryMode::Index, QueryMode::Index) => QueryMode::Index,
            _ => QueryMode::Document,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Index => "INDEX",
            QueryMode::Document => "DOCUMENT",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of asking a node to answer from one index.
///
/// `Unsupported` is routine control flow, not a failure: the caller falls
/// back to Document mode.
pub enum IndexResolution<'a> {
    /// Entries matching the node, in index key order
    Resolved(IndexEntries<'a>),
    /// The node cannot be expressed as a traversal of this index
    Unsupported,
}

impl IndexResolution<'_> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, IndexResolution::Resolved(_))
    }
}

impl fmt::Debug for IndexResolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexResolution::Resolved(_) => f.write_str("Resolved(..)"),
            IndexResolution::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Candidate entries of a query tree plus the mode they were produced in
pub struct QueryResolution<'a> {
    pub mode: QueryMode,
    pub entries: IndexEntries<'a>,
}

impl<'a> QueryResolution<'a> {
    pub fn index(entries: IndexEntries<'a>) -> Self {
        Self {
            mode: QueryMode::Index,
            entries,
        }
    }

    pub fn document(entries: IndexEntries<'a>) -> Self {
        Self {
            mode: QueryMode::Document,
            entries,
        }
    }

    /// Drains the entries into their locations
    pub fn into_locations(self) -> Vec<DocumentLocation> {
        self.entries.map(|e| e.location).collect()
    }
}

impl fmt::Debug for QueryResolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResolution")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// A boolean predicate over documents
pub trait Query: fmt::Debug + fmt::Display + Send + Sync {
    /// Answers the predicate by traversing `index` only.
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a>;

    /// Resolves the whole subtree and reports the mode it ended up in.
    ///
    /// Never fails. In Document mode the entries are a superset of the
    /// matches and every candidate must go through [`Query::matches_document`].
    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a>;

    /// Tests one materialized document. Pure.
    fn matches_document(&self, doc: &Document) -> bool;
}

/// Key of `field` in `doc` as an index would store it
pub(crate) fn field_key(doc: &Document, field: &str) -> Option<IndexKey> {
    IndexKey::from_field(doc.get_path(field))
}

/// Every document of the collection, in primary key order
pub(crate) fn full_scan<'a>(collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
    QueryResolution::document(indexer.enumerate(collection, &IndexDescriptor::primary_key()))
}

/// Drops repeated locations, keeping the first occurrence
pub(crate) fn dedupe<'a>(entries: IndexEntries<'a>) -> IndexEntries<'a> {
    let mut seen = HashSet::new();
    Box::new(entries.filter(move |e| seen.insert(e.location)))
}

/// `run` for a node that tests a single field
pub(crate) fn run_on_field<'a, Q>(
    query: &'a Q,
    field: &str,
    collection: &CollectionHandle,
    indexer: &'a dyn IndexService,
) -> QueryResolution<'a>
where
    Q: Query + ?Sized,
{
    if let Some(index) = indexer.index_for(collection, field) {
        if let IndexResolution::Resolved(entries) = query.resolve_via_index(indexer, collection, &index) {
            return QueryResolution::index(entries);
        }
    }

    debug!(
        event = %Event::QueryModeFallback,
        collection = collection.name(),
        field,
        query = %query,
        "falling back to document scan"
    );
    full_scan(collection, indexer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_combine() {
        use QueryMode::*;
        assert_eq!(Index.combine(Index), Index);
        assert_eq!(Index.combine(Document), Document);
        assert_eq!(Document.combine(Index), Document);
        assert_eq!(Document.combine(Document), Document);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(QueryMode::Index.to_string(), "INDEX");
        assert_eq!(QueryMode::Document.to_string(), "DOCUMENT");
    }

    #[test]
    fn test_missing_field_keys_as_null() {
        let doc = Document::new().with("a", 1);
        assert_eq!(field_key(&doc, "b"), Some(IndexKey::Null));
        assert_eq!(field_key(&doc, "a"), Some(IndexKey::Int(1)));
    }
}
