//! In-memory collection store
//!
//! Reference implementation of both external collaborators the query engine
//! talks to: [`IndexService`] for index traversal and [`DocumentSource`] for
//! loading documents by location.
//!
//! # API
//!
//! - `create_collection(name)` - Create a collection with its `_id` index
//! - `ensure_index(collection, field, unique)` - Build a secondary index
//! - `insert(collection, location, doc)` - Store and index a document
//! - `delete(collection, location)` - Remove a document from all indexes

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::document::{DocValue, Document};
use crate::executor::{DocumentSource, ExecutorResult};

use super::btree::{IndexKey, IndexTree};
use super::errors::{IndexError, IndexResult};
use super::service::{CollectionHandle, DocumentLocation, IndexDescriptor, IndexEntries, IndexService};

/// One index and its tree
#[derive(Debug)]
struct FieldIndex {
    descriptor: IndexDescriptor,
    tree: IndexTree,
}

impl FieldIndex {
    fn key_for(&self, doc: &Document) -> Option<IndexKey> {
        IndexKey::from_field(doc.get_path(&self.descriptor.field))
    }
}

/// Documents and indexes of one collection
#[derive(Debug, Default)]
struct CollectionData {
    documents: BTreeMap<DocumentLocation, Document>,
    indexes: HashMap<String, FieldIndex>,
}

impl CollectionData {
    fn new() -> Self {
        let mut data = Self::default();
        let pk = IndexDescriptor::primary_key();
        data.indexes.insert(
            pk.field.clone(),
            FieldIndex {
                descriptor: pk,
                tree: IndexTree::new(),
            },
        );
        data
    }

    /// Rejects an `_id` that cannot be keyed; such a document would be
    /// invisible to every scan of the primary key index.
    fn check_id(doc: &Document) -> IndexResult<()> {
        match doc.id() {
            Some(id @ (DocValue::Array(_) | DocValue::Document(_))) => Err(IndexError::invalid_id(id.type_name())),
            _ => Ok(()),
        }
    }

    /// Rejects the write if any unique index already maps the key elsewhere.
    ///
    /// Null keys (including a missing field) never collide.
    fn check_unique(&self, doc: &Document, location: DocumentLocation) -> IndexResult<()> {
        for index in self.indexes.values().filter(|i| i.descriptor.unique) {
            let Some(key) = index.key_for(doc) else {
                continue;
            };
            if key == IndexKey::Null {
                continue;
            }
            if index
                .tree
                .lookup_eq(&key)
                .iter()
                .any(|existing| *existing != location)
            {
                return Err(IndexError::unique_violation(&index.descriptor.name, key));
            }
        }
        Ok(())
    }

    fn index_document(&mut self, doc: &Document, location: DocumentLocation) {
        for index in self.indexes.values_mut() {
            if let Some(key) = index.key_for(doc) {
                index.tree.insert(key, location);
            }
        }
    }

    fn unindex_document(&mut self, doc: &Document, location: DocumentLocation) {
        for index in self.indexes.values_mut() {
            if let Some(key) = index.key_for(doc) {
                index.tree.remove(&key, location);
            }
        }
    }
}

/// Thread-safe in-memory store of documents and their indexes
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionData>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CollectionData>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CollectionData>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a collection (with its `_id` index) if it does not exist
    pub fn create_collection(&self, name: &str) -> CollectionHandle {
        self.write()
            .entry(name.to_string())
            .or_insert_with(CollectionData::new);
        CollectionHandle::new(name)
    }

    /// Creates an index on `field` and fills it from the stored documents.
    ///
    /// Existing indexes are left untouched.
    pub fn ensure_index(
        &self,
        collection: &CollectionHandle,
        field: &str,
        unique: bool,
    ) -> IndexResult<IndexDescriptor> {
        let mut collections = self.write();
        let data = collections
            .get_mut(collection.name())
            .ok_or_else(|| IndexError::unknown_collection(collection.name()))?;

        if let Some(existing) = data.indexes.get(field) {
            return Ok(existing.descriptor.clone());
        }

        let mut index = FieldIndex {
            descriptor: IndexDescriptor::new(field, unique),
            tree: IndexTree::new(),
        };
        for (location, doc) in &data.documents {
            let Some(key) = index.key_for(doc) else {
                continue;
            };
            if unique && key != IndexKey::Null && index.tree.contains_key(&key) {
                return Err(IndexError::unique_violation(field, key));
            }
            index.tree.insert(key, *location);
        }

        debug!(
            collection = collection.name(),
            field,
            entries = index.tree.entry_count(),
            "index built"
        );
        let descriptor = index.descriptor.clone();
        data.indexes.insert(field.to_string(), index);
        Ok(descriptor)
    }

    /// Stores `doc` at `location`, replacing whatever was there.
    ///
    /// Unique indexes are checked before anything changes.
    pub fn insert(
        &self,
        collection: &CollectionHandle,
        location: DocumentLocation,
        doc: Document,
    ) -> IndexResult<()> {
        let mut collections = self.write();
        let data = collections
            .get_mut(collection.name())
            .ok_or_else(|| IndexError::unknown_collection(collection.name()))?;

        CollectionData::check_id(&doc)?;
        data.check_unique(&doc, location)?;

        if let Some(old) = data.documents.remove(&location) {
            data.unindex_document(&old, location);
        }
        data.index_document(&doc, location);
        data.documents.insert(location, doc);
        Ok(())
    }

    /// Removes the document at `location`, returning it
    pub fn delete(
        &self,
        collection: &CollectionHandle,
        location: DocumentLocation,
    ) -> IndexResult<Option<Document>> {
        let mut collections = self.write();
        let data = collections
            .get_mut(collection.name())
            .ok_or_else(|| IndexError::unknown_collection(collection.name()))?;

        let removed = data.documents.remove(&location);
        if let Some(doc) = &removed {
            data.unindex_document(doc, location);
        }
        Ok(removed)
    }

    /// Number of documents in a collection (0 if unknown)
    pub fn count(&self, collection: &CollectionHandle) -> usize {
        self.read()
            .get(collection.name())
            .map_or(0, |data| data.documents.len())
    }

    /// Descriptors of every index on a collection, sorted by name
    pub fn indexes(&self, collection: &CollectionHandle) -> Vec<IndexDescriptor> {
        let mut descriptors: Vec<_> = self
            .read()
            .get(collection.name())
            .map(|data| data.indexes.values().map(|i| i.descriptor.clone()).collect())
            .unwrap_or_default();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl IndexService for MemoryStore {
    fn enumerate<'a>(&'a self, collection: &CollectionHandle, index: &IndexDescriptor) -> IndexEntries<'a> {
        self.find_range(collection, index, Bound::Unbounded, Bound::Unbounded)
    }

    fn index_for(&self, collection: &CollectionHandle, field: &str) -> Option<IndexDescriptor> {
        self.read()
            .get(collection.name())?
            .indexes
            .get(field)
            .map(|i| i.descriptor.clone())
    }

    fn find_range<'a>(
        &'a self,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
        lower: Bound<IndexKey>,
        upper: Bound<IndexKey>,
    ) -> IndexEntries<'a> {
        // Entries are copied out under the read lock so the traversal sees one snapshot
        let entries = self
            .read()
            .get(collection.name())
            .and_then(|data| data.indexes.get(&index.field))
            .map(|i| i.tree.lookup_range(lower.as_ref(), upper.as_ref()))
            .unwrap_or_default();
        Box::new(entries.into_iter())
    }
}

impl DocumentSource for MemoryStore {
    fn load(
        &self,
        collection: &CollectionHandle,
        location: DocumentLocation,
    ) -> ExecutorResult<Option<Document>> {
        Ok(self
            .read()
            .get(collection.name())
            .and_then(|data| data.documents.get(&location).cloned()))
    }
}
