//! Query executor for aerodoc
//!
//! Execution flow (strict order):
//! 1. Run the query tree to obtain candidate entries and the resolved mode
//! 2. Drop repeated locations, keeping first occurrence order
//! 3. Load each candidate document through the [`DocumentSource`]
//! 4. In Document mode, keep only documents the query matches
//! 5. Apply skip, then limit
//! 6. Return results in candidate order

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::document::Document;
use crate::index::{CollectionHandle, DocumentLocation, IndexService};
use crate::observability::{Event, MetricsRegistry};
use crate::query::{Query, QueryMode};

use super::errors::ExecutorResult;
use super::result::{ExecutionResult, ResultDocument};

/// Trait for reading documents from storage
pub trait DocumentSource: Send + Sync {
    /// Loads the document at `location`.
    ///
    /// Returns None if nothing is stored there.
    /// Returns Err if the storage layer fails.
    fn load(&self, collection: &CollectionHandle, location: DocumentLocation) -> ExecutorResult<Option<Document>>;
}

/// Query executor that drives a query tree against storage
pub struct QueryExecutor<'a, I: IndexService, S: DocumentSource> {
    indexer: &'a I,
    source: &'a S,
    metrics: MetricsRegistry,
}

impl<'a, I: IndexService, S: DocumentSource> QueryExecutor<'a, I, S> {
    /// Creates a new executor
    pub fn new(indexer: &'a I, source: &'a S) -> Self {
        Self {
            indexer,
            source,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Counters accumulated across executions
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Executes a query and returns every matching document.
    pub fn execute(&self, collection: &CollectionHandle, query: &dyn Query) -> ExecutorResult<ExecutionResult> {
        self.execute_with(collection, query, 0, None)
    }

    /// Executes a query, skipping the first `skip` matches and returning at
    /// most `limit` documents.
    pub fn execute_with(
        &self,
        collection: &CollectionHandle,
        query: &dyn Query,
        skip: usize,
        limit: Option<usize>,
    ) -> ExecutorResult<ExecutionResult> {
        debug!(
            event = %Event::QueryReceived,
            collection = collection.name(),
            query = %query,
            skip,
            limit,
        );

        // Step 1: resolve the tree
        let resolution = query.run(collection, self.indexer);
        let mode = resolution.mode;

        let mut result = ExecutionResult::empty(mode);
        if limit == Some(0) {
            return Ok(self.finish(collection, result));
        }

        let mut seen = HashSet::new();
        let mut skipped = 0;

        for entry in resolution.entries {
            // Step 2: first occurrence wins
            if !seen.insert(entry.location) {
                continue;
            }

            // Step 3: load
            result.scanned_count += 1;
            let Some(document) = self.source.load(collection, entry.location)? else {
                trace!(location = %entry.location, "candidate vanished, skipping");
                continue;
            };

            // Step 4: Document mode re-checks the full predicate
            if mode == QueryMode::Document && !query.matches_document(&document) {
                continue;
            }

            // Step 5: skip and limit
            if skipped < skip {
                skipped += 1;
                continue;
            }
            result.documents.push(ResultDocument::new(entry.location, document));
            if limit.is_some_and(|l| result.documents.len() >= l) {
                break;
            }
        }

        Ok(self.finish(collection, result))
    }

    fn finish(&self, collection: &CollectionHandle, mut result: ExecutionResult) -> ExecutionResult {
        result.returned_count = result.documents.len();

        self.metrics.record_query(result.mode);
        self.metrics.add_documents_scanned(result.scanned_count as u64);

        debug!(
            event = %Event::QueryExecuted,
            collection = collection.name(),
            mode = %result.mode,
            scanned = result.scanned_count,
            returned = result.returned_count,
        );
        result
    }
}
