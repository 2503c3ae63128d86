//! Reverse mapping: documents back to typed values
//!
//! Widened integers narrow back with a range check, except `u64`, which
//! reinterprets the stored `i64` bits and so round-trips exactly. Structured
//! values stored through an `object` slot are rebuilt from their `_type`
//! discriminator using the types registered on the mapper; no dynamic
//! loading is involved.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::document::{DocValue, Document, ObjectId, TYPE_FIELD};

use super::errors::{MapperError, MapperResult};
use super::kind::{Binary, Serializable};
use super::serialize::DocumentMapper;

/// Builds a registered type from its document
pub(crate) type Constructor = fn(&Document, &DocumentMapper) -> MapperResult<Box<dyn Serializable>>;

pub(crate) fn construct<T>(doc: &Document, mapper: &DocumentMapper) -> MapperResult<Box<dyn Serializable>>
where
    T: FromDocument + Serializable,
{
    Ok(Box::new(T::from_document(doc, mapper)?))
}

/// A value that can be read back from a [`DocValue`]
pub trait FromDocValue: Sized {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self>;
}

/// A structured type that can be read back from a [`Document`]
pub trait FromDocument: Sized {
    fn from_document(doc: &Document, mapper: &DocumentMapper) -> MapperResult<Self>;
}

/// Implements [`FromDocValue`] for types that implement [`FromDocument`]
#[macro_export]
macro_rules! impl_from_document {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::mapper::FromDocValue for $ty {
                fn from_doc_value(
                    value: &$crate::document::DocValue,
                    mapper: &$crate::mapper::DocumentMapper,
                ) -> $crate::mapper::MapperResult<Self> {
                    match value {
                        $crate::document::DocValue::Document(doc) => {
                            <$ty as $crate::mapper::FromDocument>::from_document(doc, mapper)
                        }
                        other => Err($crate::mapper::MapperError::type_mismatch("document", other)),
                    }
                }
            }
        )+
    };
}

impl DocumentMapper {
    /// Reads a structured value from `doc`
    pub fn to_object<T: FromDocument>(&self, doc: &Document) -> MapperResult<T> {
        T::from_document(doc, self)
    }

    /// Reads any value
    pub fn from_value<T: FromDocValue>(&self, value: &DocValue) -> MapperResult<T> {
        T::from_doc_value(value, self)
    }

    /// Reads member `name` of `doc`. A missing field reads as null.
    pub fn field<T: FromDocValue>(&self, doc: &Document, name: &str) -> MapperResult<T> {
        let value = doc.get(name).unwrap_or(&DocValue::Null);
        T::from_doc_value(value, self).map_err(|e| e.at(name))
    }

    /// Rebuilds a value from the type named in its `_type` field
    pub fn to_object_dyn(&self, doc: &Document) -> MapperResult<Box<dyn Serializable>> {
        let Some(discriminator) = doc.get(TYPE_FIELD).and_then(DocValue::as_str) else {
            return Err(MapperError::UnknownType(format!("document has no {} field", TYPE_FIELD)));
        };
        let build = self
            .types
            .get(discriminator)
            .ok_or_else(|| MapperError::UnknownType(discriminator.to_string()))?;
        build(doc, self)
    }
}

macro_rules! from_exact {
    ($($ty:ty => $variant:ident, $expected:literal);* $(;)?) => {
        $(
            impl FromDocValue for $ty {
                fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
                    match value {
                        DocValue::$variant(v) => Ok(v.clone()),
                        other => Err(MapperError::type_mismatch($expected, other)),
                    }
                }
            }
        )*
    };
}

from_exact! {
    bool => Boolean, "boolean";
    Decimal => Decimal, "decimal";
    ObjectId => ObjectId, "objectid";
    Uuid => Guid, "guid";
    DateTime<Utc> => DateTime, "datetime";
}

/// Integer types narrowed back from the widened stored value
macro_rules! from_integer {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromDocValue for $ty {
                fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
                    let wide = match value {
                        DocValue::Int32(v) => i64::from(*v),
                        DocValue::Int64(v) => *v,
                        other => return Err(MapperError::type_mismatch($expected, other)),
                    };
                    <$ty>::try_from(wide).map_err(|_| MapperError::type_mismatch($expected, value))
                }
            }
        )*
    };
}

from_integer! {
    i8 => "int8",
    u8 => "uint8",
    i16 => "int16",
    u16 => "uint16",
    i32 => "int32",
    u32 => "uint32",
    i64 => "int64",
}

impl FromDocValue for u64 {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Int64(v) => Ok(*v as u64),
            DocValue::Int32(v) if *v >= 0 => Ok(*v as u64),
            other => Err(MapperError::type_mismatch("uint64", other)),
        }
    }
}

impl FromDocValue for f64 {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Double(v) => Ok(*v),
            DocValue::Int32(v) => Ok(f64::from(*v)),
            DocValue::Int64(v) => Ok(*v as f64),
            other => Err(MapperError::type_mismatch("double", other)),
        }
    }
}

impl FromDocValue for f32 {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
        f64::from_doc_value(value, mapper).map(|v| v as f32)
    }
}

impl FromDocValue for String {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::String(s) => Ok(s.clone()),
            // Empty strings are stored as null by default
            DocValue::Null => Ok(String::new()),
            other => Err(MapperError::type_mismatch("string", other)),
        }
    }
}

impl FromDocValue for char {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        let mut chars = value.as_str().unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MapperError::type_mismatch("char", value)),
        }
    }
}

impl FromDocValue for Binary {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Binary(bytes) => Ok(Binary(bytes.clone())),
            other => Err(MapperError::type_mismatch("binary", other)),
        }
    }
}

impl FromDocValue for DocValue {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        Ok(value.clone())
    }
}

impl FromDocValue for Document {
    fn from_doc_value(value: &DocValue, _: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Document(doc) => Ok(doc.clone()),
            other => Err(MapperError::type_mismatch("document", other)),
        }
    }
}

impl<T: FromDocValue> FromDocValue for Option<T> {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Null => Ok(None),
            other => T::from_doc_value(other, mapper).map(Some),
        }
    }
}

impl<T: FromDocValue> FromDocValue for Box<T> {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
        T::from_doc_value(value, mapper).map(Box::new)
    }
}

impl<T: FromDocValue> FromDocValue for Vec<T> {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
        let Some(items) = value.as_array() else {
            return Err(MapperError::type_mismatch("array", value));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_doc_value(item, mapper).map_err(|e| e.at(&i.to_string())))
            .collect()
    }
}

macro_rules! from_map {
    ($($container:ident),* $(,)?) => {
        $(
            impl<V: FromDocValue> FromDocValue for $container<String, V> {
                fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
                    let Some(doc) = value.as_document() else {
                        return Err(MapperError::type_mismatch("document", value));
                    };
                    doc.iter()
                        .map(|(k, v)| {
                            V::from_doc_value(v, mapper)
                                .map(|v| (k.clone(), v))
                                .map_err(|e| e.at(k))
                        })
                        .collect()
                }
            }
        )*
    };
}

from_map!(HashMap, BTreeMap, IndexMap);

/// Values stored through an `object` slot. Documents carrying `_type` are
/// rebuilt as their registered type; anything else comes back as the raw
/// value.
impl FromDocValue for Box<dyn Serializable> {
    fn from_doc_value(value: &DocValue, mapper: &DocumentMapper) -> MapperResult<Self> {
        match value {
            DocValue::Document(doc) if doc.contains_key(TYPE_FIELD) => mapper.to_object_dyn(doc),
            DocValue::Document(doc) => Ok(Box::new(doc.clone())),
            other => Ok(Box::new(other.clone())),
        }
    }
}
