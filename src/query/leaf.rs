//! Single-field query nodes
//!
//! Both strategies compare through [`IndexKey`], so a leaf answers the same
//! set whether it runs off an index or over documents. A field whose value
//! has no key (arrays, embedded documents) never matches.

use std::fmt;
use std::ops::{Bound, RangeBounds};

use crate::document::{DocValue, Document};
use crate::index::{CollectionHandle, IndexDescriptor, IndexEntries, IndexKey, IndexService};

use super::node::{field_key, run_on_field, IndexResolution, Query, QueryResolution};

fn same_field(index: &IndexDescriptor, field: &str) -> bool {
    index.field == field
}

// =============================================================================
// All
// =============================================================================

/// Matches every document
#[derive(Debug, Clone, Default)]
pub struct QueryAll;

impl QueryAll {
    pub fn new() -> Self {
        Self
    }
}

impl Query for QueryAll {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        // Only the primary key index is guaranteed to hold every document
        if !index.is_primary_key() {
            return IndexResolution::Unsupported;
        }
        IndexResolution::Resolved(indexer.enumerate(collection, index))
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        QueryResolution::index(indexer.enumerate(collection, &IndexDescriptor::primary_key()))
    }

    fn matches_document(&self, _doc: &Document) -> bool {
        true
    }
}

impl fmt::Display for QueryAll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("all")
    }
}

// =============================================================================
// Equals
// =============================================================================

/// `field = value`
#[derive(Debug, Clone)]
pub struct QueryEquals {
    field: String,
    value: DocValue,
    key: Option<IndexKey>,
}

impl QueryEquals {
    pub fn new(field: impl Into<String>, value: impl Into<DocValue>) -> Self {
        let value = value.into();
        Self {
            field: field.into(),
            key: IndexKey::from_value(&value),
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &DocValue {
        &self.value
    }
}

impl Query for QueryEquals {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        let Some(key) = &self.key else {
            return IndexResolution::Unsupported;
        };
        if !same_field(index, &self.field) {
            return IndexResolution::Unsupported;
        }
        IndexResolution::Resolved(indexer.find_range(
            collection,
            index,
            Bound::Included(key.clone()),
            Bound::Included(key.clone()),
        ))
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        run_on_field(self, &self.field, collection, indexer)
    }

    fn matches_document(&self, doc: &Document) -> bool {
        match &self.key {
            Some(key) => field_key(doc, &self.field).as_ref() == Some(key),
            None => false,
        }
    }
}

impl fmt::Display for QueryEquals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.field, self.value)
    }
}

// =============================================================================
// Range
// =============================================================================

/// Keys between two bounds, restricted to keys comparable with the bounds
#[derive(Debug, Clone)]
pub struct QueryRange {
    field: String,
    lower: Bound<DocValue>,
    upper: Bound<DocValue>,
    /// None when a bound value has no key; such a range matches nothing
    keys: Option<(Bound<IndexKey>, Bound<IndexKey>)>,
}

fn key_bound(bound: &Bound<DocValue>) -> Option<Bound<IndexKey>> {
    Some(match bound {
        Bound::Included(v) => Bound::Included(IndexKey::from_value(v)?),
        Bound::Excluded(v) => Bound::Excluded(IndexKey::from_value(v)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

fn bound_key(bound: &Bound<IndexKey>) -> Option<&IndexKey> {
    match bound {
        Bound::Included(k) | Bound::Excluded(k) => Some(k),
        Bound::Unbounded => None,
    }
}

fn in_range(keys: &(Bound<IndexKey>, Bound<IndexKey>), key: &IndexKey) -> bool {
    let comparable = [bound_key(&keys.0), bound_key(&keys.1)]
        .into_iter()
        .flatten()
        .all(|b| b.comparable(key));
    comparable && keys.contains(key)
}

impl QueryRange {
    pub fn new(field: impl Into<String>, lower: Bound<DocValue>, upper: Bound<DocValue>) -> Self {
        let keys = key_bound(&lower).zip(key_bound(&upper));
        Self {
            field: field.into(),
            lower,
            upper,
            keys,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Query for QueryRange {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        let Some(keys) = &self.keys else {
            return IndexResolution::Unsupported;
        };
        if !same_field(index, &self.field) {
            return IndexResolution::Unsupported;
        }
        let entries = indexer.find_range(collection, index, keys.0.clone(), keys.1.clone());
        IndexResolution::Resolved(Box::new(entries.filter(move |e| in_range(keys, &e.key))))
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        run_on_field(self, &self.field, collection, indexer)
    }

    fn matches_document(&self, doc: &Document) -> bool {
        match (&self.keys, field_key(doc, &self.field)) {
            (Some(keys), Some(key)) => in_range(keys, &key),
            _ => false,
        }
    }
}

impl fmt::Display for QueryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (Bound::Included(lo), Bound::Included(hi)) => {
                write!(f, "{} between [{}, {}]", self.field, lo, hi)
            }
            (lower, Bound::Unbounded) => fmt_lower(f, &self.field, lower),
            (Bound::Unbounded, upper) => fmt_upper(f, &self.field, upper),
            (lower, upper) => {
                f.write_str("(")?;
                fmt_lower(f, &self.field, lower)?;
                f.write_str(" and ")?;
                fmt_upper(f, &self.field, upper)?;
                f.write_str(")")
            }
        }
    }
}

fn fmt_lower(f: &mut fmt::Formatter<'_>, field: &str, bound: &Bound<DocValue>) -> fmt::Result {
    match bound {
        Bound::Included(v) => write!(f, "{} >= {}", field, v),
        Bound::Excluded(v) => write!(f, "{} > {}", field, v),
        Bound::Unbounded => write!(f, "{} > -inf", field),
    }
}

fn fmt_upper(f: &mut fmt::Formatter<'_>, field: &str, bound: &Bound<DocValue>) -> fmt::Result {
    match bound {
        Bound::Included(v) => write!(f, "{} <= {}", field, v),
        Bound::Excluded(v) => write!(f, "{} < {}", field, v),
        Bound::Unbounded => write!(f, "{} < +inf", field),
    }
}

// =============================================================================
// In
// =============================================================================

/// `field in [values]`, the union of equality lookups
#[derive(Debug, Clone)]
pub struct QueryIn {
    field: String,
    values: Vec<DocValue>,
    /// Sorted and deduplicated, so each document appears once
    keys: Vec<IndexKey>,
}

impl QueryIn {
    pub fn new<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DocValue>,
    {
        let values: Vec<DocValue> = values.into_iter().map(Into::into).collect();
        let mut keys: Vec<IndexKey> = values.iter().filter_map(IndexKey::from_value).collect();
        keys.sort();
        keys.dedup();
        Self {
            field: field.into(),
            values,
            keys,
        }
    }
}

impl Query for QueryIn {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        if !same_field(index, &self.field) {
            return IndexResolution::Unsupported;
        }
        let collection = collection.clone();
        let index = index.clone();
        let entries: IndexEntries<'a> = Box::new(self.keys.iter().flat_map(move |key| {
            indexer.find_range(
                &collection,
                &index,
                Bound::Included(key.clone()),
                Bound::Included(key.clone()),
            )
        }));
        IndexResolution::Resolved(entries)
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        run_on_field(self, &self.field, collection, indexer)
    }

    fn matches_document(&self, doc: &Document) -> bool {
        field_key(doc, &self.field).is_some_and(|key| self.keys.binary_search(&key).is_ok())
    }
}

impl fmt::Display for QueryIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in [", self.field)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// Not
// =============================================================================

/// `field != value`
#[derive(Debug, Clone)]
pub struct QueryNot {
    field: String,
    value: DocValue,
    key: Option<IndexKey>,
}

impl QueryNot {
    pub fn new(field: impl Into<String>, value: impl Into<DocValue>) -> Self {
        let value = value.into();
        Self {
            field: field.into(),
            key: IndexKey::from_value(&value),
            value,
        }
    }
}

impl Query for QueryNot {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        if !same_field(index, &self.field) {
            return IndexResolution::Unsupported;
        }
        let entries = indexer.enumerate(collection, index);
        IndexResolution::Resolved(Box::new(
            entries.filter(move |e| Some(&e.key) != self.key.as_ref()),
        ))
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        run_on_field(self, &self.field, collection, indexer)
    }

    fn matches_document(&self, doc: &Document) -> bool {
        match field_key(doc, &self.field) {
            Some(key) => Some(&key) != self.key.as_ref(),
            None => false,
        }
    }
}

impl fmt::Display for QueryNot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} != {}", self.field, self.value)
    }
}

// =============================================================================
// StartsWith
// =============================================================================

/// String fields beginning with `prefix`
#[derive(Debug, Clone)]
pub struct QueryStartsWith {
    field: String,
    prefix: String,
}

impl QueryStartsWith {
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    fn accepts(&self, key: &IndexKey) -> bool {
        matches!(key, IndexKey::String(s) if s.starts_with(&self.prefix))
    }
}

impl Query for QueryStartsWith {
    fn resolve_via_index<'a>(
        &'a self,
        indexer: &'a dyn IndexService,
        collection: &CollectionHandle,
        index: &IndexDescriptor,
    ) -> IndexResolution<'a> {
        if !same_field(index, &self.field) {
            return IndexResolution::Unsupported;
        }
        // Strings sharing a prefix are contiguous in key order
        let entries = indexer.find_range(
            collection,
            index,
            Bound::Included(IndexKey::String(self.prefix.clone())),
            Bound::Unbounded,
        );
        IndexResolution::Resolved(Box::new(entries.take_while(move |e| self.accepts(&e.key))))
    }

    fn run<'a>(&'a self, collection: &CollectionHandle, indexer: &'a dyn IndexService) -> QueryResolution<'a> {
        run_on_field(self, &self.field, collection, indexer)
    }

    fn matches_document(&self, doc: &Document) -> bool {
        field_key(doc, &self.field).is_some_and(|key| self.accepts(&key))
    }
}

impl fmt::Display for QueryStartsWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} startsWith {}", self.field, DocValue::from(self.prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ID_FIELD;
    use crate::index::MemoryStore;
    use crate::query::QueryMode;

    fn store() -> (MemoryStore, CollectionHandle) {
        let store = MemoryStore::new();
        let people = store.create_collection("people");
        let rows: [(u64, i32, &str, DocValue); 5] = [
            (1, 30, "alice", DocValue::Int32(10)),
            (2, 25, "bob", DocValue::Double(10.0)),
            (3, 41, "alfred", DocValue::String("10".into())),
            (4, 30, "carol", DocValue::Null),
            (5, 19, "al", DocValue::Int64(3)),
        ];
        for (loc, age, name, score) in rows {
            let doc = Document::new()
                .with(ID_FIELD, loc as i64)
                .with("age", age)
                .with("name", name)
                .with("score", score);
            store.insert(&people, loc.into(), doc).unwrap();
        }
        (store, people)
    }

    fn run_locations(query: &dyn Query, store: &MemoryStore, people: &CollectionHandle) -> (QueryMode, Vec<u64>) {
        let resolution = query.run(people, store);
        let mode = resolution.mode;
        let mut locs: Vec<u64> = resolution.entries.map(|e| e.location.get()).collect();
        locs.sort();
        (mode, locs)
    }

    /// Locations of documents for which `matches_document` holds
    fn scan_locations(query: &dyn Query, store: &MemoryStore, people: &CollectionHandle) -> Vec<u64> {
        use crate::executor::DocumentSource;
        let mut locs = Vec::new();
        for entry in store.enumerate(people, &IndexDescriptor::primary_key()) {
            let doc = store.load(people, entry.location).unwrap().unwrap();
            if query.matches_document(&doc) {
                locs.push(entry.location.get());
            }
        }
        locs.sort();
        locs
    }

    fn assert_modes_agree(query: &dyn Query, field: &str) {
        let (store, people) = store();
        let expected = scan_locations(query, &store, &people);

        let (mode, locs) = run_locations(query, &store, &people);
        assert_eq!(mode, QueryMode::Document);
        assert_eq!(scan_filtered(query, &store, &people, locs), expected);

        store.ensure_index(&people, field, false).unwrap();
        let (mode, locs) = run_locations(query, &store, &people);
        assert_eq!(mode, QueryMode::Index, "{}", query);
        assert_eq!(locs, expected, "{}", query);
    }

    fn scan_filtered(query: &dyn Query, store: &MemoryStore, people: &CollectionHandle, locs: Vec<u64>) -> Vec<u64> {
        use crate::executor::DocumentSource;
        locs.into_iter()
            .filter(|loc| {
                let doc = store.load(people, (*loc).into()).unwrap().unwrap();
                query.matches_document(&doc)
            })
            .collect()
    }

    #[test]
    fn test_all_runs_in_index_mode() {
        let (store, people) = store();
        let (mode, locs) = run_locations(&QueryAll::new(), &store, &people);
        assert_eq!(mode, QueryMode::Index);
        assert_eq!(locs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_equals() {
        let query = QueryEquals::new("age", 30);
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![1, 4]);
        assert_modes_agree(&query, "age");
    }

    #[test]
    fn test_equals_distinguishes_numeric_kinds() {
        // Int32(10) and Double(10.0) are different keys
        let query = QueryEquals::new("score", 10);
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![1]);
        assert_modes_agree(&query, "score");
    }

    #[test]
    fn test_equals_null_matches_null_field() {
        let query = QueryEquals::new("score", DocValue::Null);
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![4]);
        assert_modes_agree(&query, "score");
    }

    #[test]
    fn test_range_bounds() {
        let (store, people) = store();
        let gt = QueryRange::new("age", Bound::Excluded(30.into()), Bound::Unbounded);
        assert_eq!(scan_locations(&gt, &store, &people), vec![3]);

        let gte = QueryRange::new("age", Bound::Included(30.into()), Bound::Unbounded);
        assert_eq!(scan_locations(&gte, &store, &people), vec![1, 3, 4]);

        let between = QueryRange::new("age", Bound::Included(19.into()), Bound::Included(25.into()));
        assert_eq!(scan_locations(&between, &store, &people), vec![2, 5]);

        for query in [gt, gte, between] {
            assert_modes_agree(&query, "age");
        }
    }

    #[test]
    fn test_range_skips_incomparable_kinds() {
        // String "10" and Null sort outside numbers and must not leak in
        let query = QueryRange::new("score", Bound::Unbounded, Bound::Included(100.into()));
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![1, 2, 5]);
        assert_modes_agree(&query, "score");
    }

    #[test]
    fn test_empty_range_matches_nothing() {
        let query = QueryRange::new("age", Bound::Included(50.into()), Bound::Included(10.into()));
        assert_modes_agree(&query, "age");
    }

    #[test]
    fn test_in() {
        let query = QueryIn::new("age", [19, 41, 19]);
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![3, 5]);
        assert_modes_agree(&query, "age");
    }

    #[test]
    fn test_not() {
        let query = QueryNot::new("age", 30);
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![2, 3, 5]);
        assert_modes_agree(&query, "age");
    }

    #[test]
    fn test_starts_with() {
        let query = QueryStartsWith::new("name", "al");
        let (store, people) = store();
        assert_eq!(scan_locations(&query, &store, &people), vec![1, 3, 5]);
        assert_modes_agree(&query, "name");
    }

    #[test]
    fn test_unkeyable_value_is_unsupported() {
        let (store, people) = store();
        store.ensure_index(&people, "age", false).unwrap();
        let index = store.index_for(&people, "age").unwrap();

        let query = QueryEquals::new("age", DocValue::Array(vec![]));
        assert!(!query.resolve_via_index(&store, &people, &index).is_resolved());
        assert_eq!(run_locations(&query, &store, &people).0, QueryMode::Document);
    }

    #[test]
    fn test_wrong_index_is_unsupported() {
        let (store, people) = store();
        store.ensure_index(&people, "name", false).unwrap();
        let index = store.index_for(&people, "name").unwrap();

        let query = QueryEquals::new("age", 30);
        assert!(!query.resolve_via_index(&store, &people, &index).is_resolved());
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryEquals::new("x", 1).to_string(), "x = 1");
        assert_eq!(QueryNot::new("x", "a").to_string(), "x != \"a\"");
        assert_eq!(QueryIn::new("x", [1, 2]).to_string(), "x in [1, 2]");
        assert_eq!(
            QueryRange::new("x", Bound::Excluded(1.into()), Bound::Unbounded).to_string(),
            "x > 1"
        );
        assert_eq!(
            QueryRange::new("x", Bound::Included(1.into()), Bound::Excluded(5.into())).to_string(),
            "(x >= 1 and x < 5)"
        );
        assert_eq!(QueryStartsWith::new("n", "al").to_string(), "n startsWith \"al\"");
    }
}
