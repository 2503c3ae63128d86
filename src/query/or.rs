//! OR combinator

use std::fmt;

use crate::document::Document;
use crate::index::{CollectionHandle, IndexDescriptor, IndexService};

use super::node::{dedupe, full_scan, IndexResolution, Query, QueryMode, QueryResolution};

/// Disjunction of two sub-queries
#[derive(Debug)]
pub struct QueryOr {
    left: Box<dyn Query>,
    right: Box<dyn Query>,
}

impl QueryOr {
    pub fn new(left: Box<dyn Query>, right: Box<dyn Query>) -> Self {
        Self { left, right }
    }
}

impl Query for QueryOr {
    fn resolve_via_index<'a>(
        &'a self,
        _indexer: &'a dyn IndexService,
        _collection: &CollectionHandle,
        _index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        IndexResolution::Unsupported
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        let left = self.left.run(collection, indexer);
        let right = self.right.run(collection, indexer);

        match left.mode.combine(right.mode) {
            QueryMode::Index => QueryResolution::index(dedupe(Box::new(left.entries.chain(right.entries)))),
            // A Document side already covers every document
            QueryMode::Document => full_scan(collection, indexer),
        }
    }

    fn matches_document(&self, doc: &Document) -> bool {
        self.left.matches_document(doc) || self.right.matches_document(doc)
    }
}

impl fmt::Display for QueryOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} or {})", self.left, self.right)
    }
}
