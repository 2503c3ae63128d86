//! BTreeMap-based index structures
//!
//! Indexes use BTreeMap<IndexKey, Vec<DocumentLocation>> for deterministic ordering.
//! Locations under one key are always sorted ascending.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::document::{DocValue, ObjectId};

use super::service::{DocumentLocation, IndexEntry};

/// Index key derived from a document value.
///
/// Ordering is deterministic across kinds:
/// Null < Bool < numbers < String < Binary < ObjectId < Guid < DateTime.
/// Int, Float and Decimal keys compare by numeric value; a tie between two
/// different numeric kinds breaks by kind (Int < Float < Decimal) so that
/// only structurally equal keys compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Null or missing value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Int32 and Int64 values
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// Decimal value
    Decimal(Decimal),
    /// String value
    String(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// 12-byte unique identifier
    ObjectId(ObjectId),
    /// Globally unique identifier
    Guid(Uuid),
    /// Timestamp
    DateTime(DateTime<Utc>),
}

impl IndexKey {
    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        // Negative: flip all bits. Positive: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a document value.
    ///
    /// Arrays and documents are not indexable.
    pub fn from_value(value: &DocValue) -> Option<Self> {
        Some(match value {
            DocValue::Null => IndexKey::Null,
            DocValue::Boolean(b) => IndexKey::Bool(*b),
            DocValue::Int32(v) => IndexKey::Int(i64::from(*v)),
            DocValue::Int64(v) => IndexKey::Int(*v),
            DocValue::Double(v) => IndexKey::from_float(*v),
            DocValue::Decimal(d) => IndexKey::Decimal(*d),
            DocValue::String(s) => IndexKey::String(s.clone()),
            DocValue::Binary(b) => IndexKey::Binary(b.clone()),
            DocValue::ObjectId(oid) => IndexKey::ObjectId(*oid),
            DocValue::Guid(g) => IndexKey::Guid(*g),
            DocValue::DateTime(dt) => IndexKey::DateTime(*dt),
            DocValue::Array(_) | DocValue::Document(_) => return None,
        })
    }

    /// Key for an optional field value; a missing field indexes as Null.
    pub fn from_field(value: Option<&DocValue>) -> Option<Self> {
        match value {
            Some(v) => Self::from_value(v),
            None => Some(IndexKey::Null),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, IndexKey::Int(_) | IndexKey::Float(_) | IndexKey::Decimal(_))
    }

    /// True if range comparisons between the two keys are meaningful:
    /// both numeric, or both of the same kind.
    pub fn comparable(&self, other: &IndexKey) -> bool {
        (self.is_numeric() && other.is_numeric()) || self.variant() == other.variant()
    }

    fn variant(&self) -> u8 {
        match self {
            IndexKey::Null => 0,
            IndexKey::Bool(_) => 1,
            IndexKey::Int(_) => 2,
            IndexKey::Float(_) => 3,
            IndexKey::Decimal(_) => 4,
            IndexKey::String(_) => 5,
            IndexKey::Binary(_) => 6,
            IndexKey::ObjectId(_) => 7,
            IndexKey::Guid(_) => 8,
            IndexKey::DateTime(_) => 9,
        }
    }

    fn numeric_value(&self) -> f64 {
        match self {
            IndexKey::Int(v) => *v as f64,
            IndexKey::Float(ordered) => {
                let bits = if (ordered >> 63) == 1 {
                    ordered ^ (1 << 63)
                } else {
                    !ordered
                };
                f64::from_bits(bits)
            }
            IndexKey::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Null, IndexKey::Null) => Ordering::Equal,
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (IndexKey::Int(a), IndexKey::Int(b)) => a.cmp(b),
            (IndexKey::Float(a), IndexKey::Float(b)) => a.cmp(b),
            (IndexKey::Decimal(a), IndexKey::Decimal(b)) => a.cmp(b),
            (IndexKey::String(a), IndexKey::String(b)) => a.cmp(b),
            (IndexKey::Binary(a), IndexKey::Binary(b)) => a.cmp(b),
            (IndexKey::ObjectId(a), IndexKey::ObjectId(b)) => a.cmp(b),
            (IndexKey::Guid(a), IndexKey::Guid(b)) => a.cmp(b),
            (IndexKey::DateTime(a), IndexKey::DateTime(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => a
                .numeric_value()
                .total_cmp(&b.numeric_value())
                .then_with(|| a.variant().cmp(&b.variant())),
            (a, b) => a.variant().cmp(&b.variant()),
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single field index using BTreeMap for deterministic ordering.
#[derive(Debug, Default)]
pub struct IndexTree {
    tree: BTreeMap<IndexKey, Vec<DocumentLocation>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert a location for a key.
    ///
    /// Maintains sorted ascending order.
    pub fn insert(&mut self, key: IndexKey, location: DocumentLocation) {
        let locations = self.tree.entry(key).or_default();

        match locations.binary_search(&location) {
            Ok(_) => {}
            Err(pos) => locations.insert(pos, location),
        }
    }

    /// Remove a location for a key.
    ///
    /// If the key has no more locations, removes the key entirely.
    pub fn remove(&mut self, key: &IndexKey, location: DocumentLocation) {
        if let Some(locations) = self.tree.get_mut(key) {
            if let Ok(pos) = locations.binary_search(&location) {
                locations.remove(pos);
            }
            if locations.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Returns true if any location is stored under the key
    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.tree.contains_key(key)
    }

    /// Lookup all locations for an exact key match, sorted ascending.
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<DocumentLocation> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// Entries whose key falls inside the bounds, in key order.
    pub fn lookup_range(&self, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> Vec<IndexEntry> {
        if bounds_empty(lower, upper) {
            return Vec::new();
        }

        self.tree
            .range((lower, upper))
            .flat_map(|(key, locations)| {
                locations
                    .iter()
                    .map(move |location| IndexEntry::new(key.clone(), *location))
            })
            .collect()
    }

    /// Every entry in key order
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.lookup_range(Bound::Unbounded, Bound::Unbounded)
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of entries
    pub fn entry_count(&self) -> usize {
        self.tree.values().map(|v| v.len()).sum()
    }
}

/// BTreeMap::range panics on inverted or empty-exclusive bounds.
fn bounds_empty(lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u))
        | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(v: u64) -> DocumentLocation {
        DocumentLocation::new(v)
    }

    fn locations(entries: &[IndexEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.location.get()).collect()
    }

    #[test]
    fn test_key_ordering() {
        let keys = vec![
            IndexKey::Null,
            IndexKey::Bool(false),
            IndexKey::Bool(true),
            IndexKey::Int(-100),
            IndexKey::Int(0),
            IndexKey::from_float(2.5),
            IndexKey::Int(100),
            IndexKey::String("aaa".into()),
            IndexKey::String("zzz".into()),
        ];

        for i in 1..keys.len() {
            assert!(keys[i - 1] < keys[i], "Keys should be ordered");
        }
    }

    #[test]
    fn test_mixed_numeric_ordering() {
        assert!(IndexKey::Int(12) > IndexKey::from_float(10.0));
        assert!(IndexKey::from_float(-1.5) < IndexKey::Int(0));
        assert!(IndexKey::Decimal(Decimal::new(105, 1)) > IndexKey::Int(10));
        // Numeric tie breaks by kind, never Equal
        assert!(IndexKey::Int(10) < IndexKey::from_float(10.0));
        assert!(IndexKey::Int(10).comparable(&IndexKey::from_float(10.0)));
        assert!(!IndexKey::Int(10).comparable(&IndexKey::String("10".into())));
    }

    #[test]
    fn test_float_round_trip_through_ordered_bits() {
        for v in [-3.25, 0.0, 7.5, f64::MAX] {
            assert_eq!(IndexKey::from_float(v).numeric_value(), v);
        }
    }

    #[test]
    fn test_int32_and_int64_share_keys() {
        assert_eq!(
            IndexKey::from_value(&DocValue::Int32(5)),
            IndexKey::from_value(&DocValue::Int64(5))
        );
    }

    #[test]
    fn test_containers_not_indexed() {
        assert_eq!(IndexKey::from_value(&DocValue::Array(vec![])), None);
        assert_eq!(IndexKey::from_field(None), Some(IndexKey::Null));
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut tree = IndexTree::new();

        tree.insert(IndexKey::String("alice".into()), loc(100));
        tree.insert(IndexKey::String("alice".into()), loc(200));
        tree.insert(IndexKey::String("bob".into()), loc(300));

        assert_eq!(
            tree.lookup_eq(&IndexKey::String("alice".into())),
            vec![loc(100), loc(200)]
        );
        assert_eq!(tree.lookup_eq(&IndexKey::String("bob".into())), vec![loc(300)]);
    }

    #[test]
    fn test_locations_sorted() {
        let mut tree = IndexTree::new();

        tree.insert(IndexKey::Int(42), loc(300));
        tree.insert(IndexKey::Int(42), loc(100));
        tree.insert(IndexKey::Int(42), loc(200));

        assert_eq!(tree.lookup_eq(&IndexKey::Int(42)), vec![loc(100), loc(200), loc(300)]);
    }

    #[test]
    fn test_remove() {
        let mut tree = IndexTree::new();

        tree.insert(IndexKey::Int(1), loc(100));
        tree.insert(IndexKey::Int(1), loc(200));
        tree.remove(&IndexKey::Int(1), loc(100));
        assert_eq!(tree.lookup_eq(&IndexKey::Int(1)), vec![loc(200)]);

        tree.remove(&IndexKey::Int(1), loc(200));
        assert_eq!(tree.key_count(), 0);
    }

    #[test]
    fn test_lookup_range_in_key_order() {
        let mut tree = IndexTree::new();

        tree.insert(IndexKey::Int(5), loc(100));
        tree.insert(IndexKey::Int(2), loc(500));
        tree.insert(IndexKey::Int(3), loc(300));
        tree.insert(IndexKey::Int(4), loc(200));
        tree.insert(IndexKey::Int(1), loc(400));

        let entries = tree.lookup_range(
            Bound::Included(&IndexKey::Int(2)),
            Bound::Excluded(&IndexKey::Int(5)),
        );
        assert_eq!(locations(&entries), vec![500, 300, 200]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut tree = IndexTree::new();
        tree.insert(IndexKey::Int(1), loc(1));

        let entries = tree.lookup_range(
            Bound::Excluded(&IndexKey::Int(3)),
            Bound::Excluded(&IndexKey::Int(3)),
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn test_entry_count() {
        let mut tree = IndexTree::new();
        tree.insert(IndexKey::Int(1), loc(1));
        tree.insert(IndexKey::Int(1), loc(2));
        tree.insert(IndexKey::Int(2), loc(3));
        assert_eq!(tree.key_count(), 2);
        assert_eq!(tree.entry_count(), 3);
        assert_eq!(tree.entries().len(), 3);
    }
}
