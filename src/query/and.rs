//! AND combinator
//!
//! Resolves both children and intersects their entry streams by document
//! location. Keys play no part in identity: the two sides usually come from
//! different indexes, so neither shares an ordering with the other.

use std::collections::HashSet;
use std::fmt;

use crate::document::Document;
use crate::index::{CollectionHandle, DocumentLocation, IndexDescriptor, IndexEntries, IndexService};

use super::node::{IndexResolution, Query, QueryResolution};

/// Conjunction of two sub-queries
#[derive(Debug)]
pub struct QueryAnd {
    left: Box<dyn Query>,
    right: Box<dyn Query>,
}

impl QueryAnd {
    pub fn new(left: Box<dyn Query>, right: Box<dyn Query>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &dyn Query {
        self.left.as_ref()
    }

    pub fn right(&self) -> &dyn Query {
        self.right.as_ref()
    }
}

/// Entries of `left` whose location also appears in `right`.
///
/// `right` is hashed once and `left` streams through as the probe side, so
/// the cost is linear in both inputs and the output keeps `left`'s order.
pub(crate) fn intersect<'a>(left: IndexEntries<'a>, right: IndexEntries<'a>) -> IndexEntries<'a> {
    let probe: HashSet<DocumentLocation> = right.map(|e| e.location).collect();
    let mut emitted = HashSet::with_capacity(probe.len());
    Box::new(left.filter(move |e| probe.contains(&e.location) && emitted.insert(e.location)))
}

impl Query for QueryAnd {
    fn resolve_via_index<'a>(
        &'a self,
        _indexer: &'a dyn IndexService,
        _collection: &CollectionHandle,
        _index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        // A conjunction has no single-index traversal; `run` resolves the
        // children and intersects instead.
        IndexResolution::Unsupported
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        let left = self.left.run(collection, indexer);
        let right = self.right.run(collection, indexer);

        QueryResolution {
            mode: left.mode.combine(right.mode),
            entries: intersect(left.entries, right.entries),
        }
    }

    fn matches_document(&self, doc: &Document) -> bool {
        self.left.matches_document(doc) && self.right.matches_document(doc)
    }
}

impl fmt::Display for QueryAnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} and {})", self.left, self.right)
    }
}
