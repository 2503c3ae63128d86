//! Insertion-ordered documents

use std::fmt;

use indexmap::map::{IntoIter, Iter, Keys};
use indexmap::IndexMap;

use super::value::DocValue;

/// Reserved identity field
pub const ID_FIELD: &str = "_id";

/// Reserved polymorphism discriminator field
pub const TYPE_FIELD: &str = "_type";

/// An ordered mapping from field name to value.
///
/// Equality ignores field order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: IndexMap<String, DocValue>,
}

impl Document {
    /// Creates an empty document
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Sets a field. An existing field keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DocValue>) -> Option<DocValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DocValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&DocValue> {
        self.fields.get(field)
    }

    /// Resolves a dotted path (`address.city`) through nested documents.
    ///
    /// A path without dots is a plain field lookup.
    pub fn get_path(&self, path: &str) -> Option<&DocValue> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_document()?.get(segment)?;
        }
        Some(current)
    }

    /// Removes a field, preserving the order of the remaining fields
    pub fn remove(&mut self, field: &str) -> Option<DocValue> {
        self.fields.shift_remove(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The `_id` value, if present
    pub fn id(&self) -> Option<&DocValue> {
        self.fields.get(ID_FIELD)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, DocValue> {
        self.fields.iter()
    }

    pub fn keys(&self) -> Keys<'_, String, DocValue> {
        self.fields.keys()
    }

    /// Extended JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        super::json::document_to_json(self)
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a DocValue);
    type IntoIter = Iter<'a, String, DocValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, DocValue);
    type IntoIter = IntoIter<String, DocValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<DocValue>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let doc = Document::new().with("b", 1).with("a", 2).with("c", 3);
        let keys: Vec<_> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = Document::new().with("x", 1).with("y", 2);
        let old = doc.insert("x", 10);
        assert_eq!(old, Some(DocValue::Int32(1)));
        let keys: Vec<_> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(doc.get("x"), Some(&DocValue::Int32(10)));
    }

    #[test]
    fn test_get_path() {
        let address = Document::new().with("city", "Lisbon");
        let doc = Document::new().with("address", address).with("name", "Ana");

        assert_eq!(doc.get_path("address.city"), Some(&DocValue::from("Lisbon")));
        assert_eq!(doc.get_path("name"), Some(&DocValue::from("Ana")));
        assert_eq!(doc.get_path("address.zip"), None);
        assert_eq!(doc.get_path("name.first"), None);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Document::new().with("x", 1).with("y", 2);
        let b = Document::new().with("y", 2).with("x", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_field() {
        let doc = Document::new().with(ID_FIELD, 5);
        assert_eq!(doc.id(), Some(&DocValue::Int32(5)));
        assert!(Document::new().id().is_none());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = Document::new().with("a", 1).with("b", 2).with("c", 3);
        doc.remove("a");
        let keys: Vec<_> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
