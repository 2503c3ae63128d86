//! Index access facade
//!
//! The query engine never touches index structures directly. It asks an
//! [`IndexService`] to enumerate entries of one index in key order and works
//! on the resulting [`IndexEntry`] stream.

use std::fmt;
use std::ops::{Bound, RangeBounds};

use crate::document::ID_FIELD;

use super::btree::IndexKey;

/// Opaque address of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentLocation(u64);

impl DocumentLocation {
    pub fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocumentLocation {
    fn from(offset: u64) -> Self {
        Self(offset)
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A reference produced by index traversal.
///
/// Set operations identify entries by `location` only; two entries from
/// different indexes referencing the same document are the same result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Sort key within the index
    pub key: IndexKey,
    /// Referenced document
    pub location: DocumentLocation,
}

impl IndexEntry {
    pub fn new(key: IndexKey, location: DocumentLocation) -> Self {
        Self { key, location }
    }
}

/// Lazy, finite stream of index entries
pub type IndexEntries<'a> = Box<dyn Iterator<Item = IndexEntry> + 'a>;

/// Named handle to a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    name: String,
}

impl CollectionHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Describes one index of a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    /// Index name, unique within the collection
    pub name: String,
    /// Indexed field (dotted paths allowed)
    pub field: String,
    /// Whether the index rejects duplicate keys
    pub unique: bool,
}

impl IndexDescriptor {
    pub fn new(field: impl Into<String>, unique: bool) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            field,
            unique,
        }
    }

    /// The `_id` index every collection has
    pub fn primary_key() -> Self {
        Self::new(ID_FIELD, true)
    }

    pub fn is_primary_key(&self) -> bool {
        self.field == ID_FIELD
    }
}

/// Access to the index structures of a collection.
///
/// Implementations must present a consistent snapshot for the duration of
/// one enumeration.
pub trait IndexService: Send + Sync {
    /// Enumerates all entries of `index` in key order
    fn enumerate<'a>(&'a self, collection: &CollectionHandle, index: &IndexDescriptor) -> IndexEntries<'a>;

    /// Returns the index defined on `field`, if any
    fn index_for(&self, collection: &CollectionHandle, field: &str) -> Option<IndexDescriptor>;

    /// Entries whose key lies within the bounds, in key order.
    ///
    /// The default filters a full enumeration; implementations backed by an
    /// ordered structure should seek instead.
    fn find_range<'a>(
        &'a self,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
        lower: Bound<IndexKey>,
        upper: Bound<IndexKey>,
    ) -> IndexEntries<'a> {
        let range = (lower, upper);
        Box::new(
            self.enumerate(collection, index)
                .filter(move |entry| range.contains(&entry.key)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIndex(Vec<IndexEntry>);

    impl IndexService for FixedIndex {
        fn enumerate<'a>(&'a self, _: &CollectionHandle, _: &IndexDescriptor) -> IndexEntries<'a> {
            Box::new(self.0.iter().cloned())
        }

        fn index_for(&self, _: &CollectionHandle, _: &str) -> Option<IndexDescriptor> {
            None
        }
    }

    #[test]
    fn test_default_find_range_filters_enumeration() {
        let index = FixedIndex(
            (1..=5)
                .map(|i| IndexEntry::new(IndexKey::Int(i), DocumentLocation::new(i as u64 * 10)))
                .collect(),
        );
        let col = CollectionHandle::new("c");

        let found: Vec<u64> = index
            .find_range(
                &col,
                &IndexDescriptor::primary_key(),
                Bound::Excluded(IndexKey::Int(2)),
                Bound::Included(IndexKey::Int(4)),
            )
            .map(|e| e.location.get())
            .collect();

        assert_eq!(found, vec![30, 40]);
    }

    #[test]
    fn test_primary_key_descriptor() {
        let pk = IndexDescriptor::primary_key();
        assert!(pk.is_primary_key());
        assert!(pk.unique);
        assert_eq!(pk.field, "_id");
    }
}
