//! The tagged document value

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::document::Document;
use super::object_id::ObjectId;

/// A self-describing document value.
///
/// Numeric kinds narrower than 32 bits never appear here: the mapper widens
/// them to `Int32` (or `Int64` for unsigned 32/64-bit values).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocValue {
    /// Absence of value
    #[default]
    Null,
    /// UTF-8 string
    String(String),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Double precision float
    Double(f64),
    /// High precision decimal
    Decimal(Decimal),
    /// Boolean
    Boolean(bool),
    /// Raw bytes
    Binary(Vec<u8>),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// 12-byte unique identifier
    ObjectId(ObjectId),
    /// Globally unique identifier
    Guid(Uuid),
    /// Ordered list of values
    Array(Vec<DocValue>),
    /// Nested document
    Document(Document),
}

impl DocValue {
    /// Returns the variant name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DocValue::Null => "null",
            DocValue::String(_) => "string",
            DocValue::Int32(_) => "int32",
            DocValue::Int64(_) => "int64",
            DocValue::Double(_) => "double",
            DocValue::Decimal(_) => "decimal",
            DocValue::Boolean(_) => "boolean",
            DocValue::Binary(_) => "binary",
            DocValue::DateTime(_) => "datetime",
            DocValue::ObjectId(_) => "objectid",
            DocValue::Guid(_) => "guid",
            DocValue::Array(_) => "array",
            DocValue::Document(_) => "document",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            DocValue::Int32(_) | DocValue::Int64(_) | DocValue::Double(_) | DocValue::Decimal(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            DocValue::Int32(v) => Some(*v),
            DocValue::Int64(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Int32(v) => Some(i64::from(*v)),
            DocValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a double (lossy for large integers and decimals)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Int32(v) => Some(f64::from(*v)),
            DocValue::Int64(v) => Some(*v as f64),
            DocValue::Double(v) => Some(*v),
            DocValue::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DocValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            DocValue::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Consumes the value, returning the document if it is one
    pub fn into_document(self) -> Option<Document> {
        match self {
            DocValue::Document(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for DocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", super::json::to_json(self))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DocValue {
                fn from(v: $ty) -> Self {
                    DocValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    String => String,
    i32 => Int32,
    i64 => Int64,
    f64 => Double,
    Decimal => Decimal,
    bool => Boolean,
    Vec<u8> => Binary,
    DateTime<Utc> => DateTime,
    ObjectId => ObjectId,
    Uuid => Guid,
    Vec<DocValue> => Array,
    Document => Document,
}

impl From<&str> for DocValue {
    fn from(v: &str) -> Self {
        DocValue::String(v.to_string())
    }
}

impl<T: Into<DocValue>> From<Option<T>> for DocValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DocValue::Null, Into::into)
    }
}
