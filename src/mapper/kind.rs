//! Serializable kinds
//!
//! Every value the mapper can write reports one [`Kind`]. The variant order
//! is the dispatch order of the serializer: a value caught by an earlier
//! arm never reaches a later one.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::document::{DocValue, Document, ObjectId};

use super::descriptor::TypeDescriptor;

/// Identity of a Rust type plus its printable path.
///
/// Equality and hashing use the `TypeId` alone.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The generic placeholder: a value declared only as "some serializable"
    pub fn object() -> Self {
        Self::of::<dyn Serializable>()
    }

    pub fn is_object(&self) -> bool {
        *self == Self::object()
    }

    /// Fully qualified type path, e.g. `app::model::Dog`
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// Crate the type is defined in
    pub fn origin(&self) -> &'static str {
        self.name.split("::").next().unwrap_or(self.name)
    }

    /// Value stored in `_type`: `"<full name>, <origin>"`
    pub fn discriminator(&self) -> String {
        format!("{}, {}", self.full_name(), self.origin())
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// What a value looks like to the serializer
pub enum Kind<'a> {
    Null,
    /// Already a document value; copied as is
    Value(&'a DocValue),
    Document(&'a Document),
    String(&'a str),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal(Decimal),
    Binary(&'a [u8]),
    ObjectId(ObjectId),
    Guid(Uuid),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Int16(i16),
    UInt16(u16),
    Int8(i8),
    UInt8(u8),
    UInt32(u32),
    UInt64(u64),
    Single(f32),
    Char(char),
    /// Enumerated label, stored as its name
    Label(Cow<'a, str>),
    /// Key-value container; keys are already in string form
    Map {
        element: TypeKey,
        entries: Box<dyn Iterator<Item = (String, &'a dyn Serializable)> + 'a>,
    },
    /// Any other sequence
    Seq {
        element: TypeKey,
        items: Box<dyn Iterator<Item = &'a dyn Serializable> + 'a>,
    },
    /// Structured object described by a [`TypeDescriptor`]
    Object,
}

impl fmt::Debug for Kind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Map { element, .. } => write!(f, "Map<{}>", element),
            Kind::Seq { element, .. } => write!(f, "Seq<{}>", element),
            Kind::Object => f.write_str("Object"),
            Kind::Null => f.write_str("Null"),
            Kind::Label(l) => write!(f, "Label({})", l),
            _ => f.write_str("Scalar"),
        }
    }
}

/// A value the mapper can turn into a [`DocValue`].
///
/// Structured types implement it through [`impl_entity!`](crate::impl_entity).
pub trait Serializable: Any + Send + Sync {
    fn kind(&self) -> Kind<'_>;

    /// Concrete runtime type
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any;

    /// Member list, for values of kind [`Kind::Object`]
    fn describe(&self) -> Option<TypeDescriptor> {
        None
    }

    /// True for the absence-of-value sentinel
    fn is_absent(&self) -> bool {
        matches!(self.kind(), Kind::Null)
    }

    /// Type a slot of this static type is declared as
    fn declared_type() -> TypeKey
    where
        Self: Sized,
    {
        TypeKey::of::<Self>()
    }
}

/// Byte buffer stored as binary; a plain `Vec<u8>` is a sequence of numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Binary(bytes)
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => |$v:ident| $kind:expr),* $(,)?) => {
        $(
            impl Serializable for $ty {
                fn kind(&self) -> Kind<'_> {
                    let $v = self;
                    $kind
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_scalar! {
    DocValue => |v| Kind::Value(v),
    Document => |v| Kind::Document(v),
    String => |v| Kind::String(v),
    &'static str => |v| Kind::String(v),
    i32 => |v| Kind::Int32(*v),
    i64 => |v| Kind::Int64(*v),
    f64 => |v| Kind::Double(*v),
    Decimal => |v| Kind::Decimal(*v),
    Binary => |v| Kind::Binary(&v.0),
    ObjectId => |v| Kind::ObjectId(*v),
    Uuid => |v| Kind::Guid(*v),
    bool => |v| Kind::Boolean(*v),
    DateTime<Utc> => |v| Kind::DateTime(*v),
    i16 => |v| Kind::Int16(*v),
    u16 => |v| Kind::UInt16(*v),
    i8 => |v| Kind::Int8(*v),
    u8 => |v| Kind::UInt8(*v),
    u32 => |v| Kind::UInt32(*v),
    u64 => |v| Kind::UInt64(*v),
    f32 => |v| Kind::Single(*v),
    char => |v| Kind::Char(*v),
}

// Option and Box are transparent: the serializer sees the inner value.

impl<T: Serializable> Serializable for Option<T> {
    fn kind(&self) -> Kind<'_> {
        match self {
            Some(v) => v.kind(),
            None => Kind::Null,
        }
    }

    fn type_key(&self) -> TypeKey {
        match self {
            Some(v) => v.type_key(),
            None => TypeKey::of::<Self>(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        match self {
            Some(v) => v.as_any(),
            None => self,
        }
    }

    fn describe(&self) -> Option<TypeDescriptor> {
        self.as_ref().and_then(Serializable::describe)
    }

    fn is_absent(&self) -> bool {
        self.as_ref().map_or(true, Serializable::is_absent)
    }

    fn declared_type() -> TypeKey {
        T::declared_type()
    }
}

impl<T: Serializable> Serializable for Box<T> {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn describe(&self) -> Option<TypeDescriptor> {
        (**self).describe()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn declared_type() -> TypeKey {
        T::declared_type()
    }
}

/// A slot that may hold any serializable value; declared as `object`
impl Serializable for Box<dyn Serializable> {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn describe(&self) -> Option<TypeDescriptor> {
        (**self).describe()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn declared_type() -> TypeKey {
        TypeKey::object()
    }
}

macro_rules! impl_seq {
    ($($container:ident),* $(,)?) => {
        $(
            impl<T: Serializable> Serializable for $container<T> {
                fn kind(&self) -> Kind<'_> {
                    Kind::Seq {
                        element: T::declared_type(),
                        items: Box::new(self.iter().map(|v| v as &dyn Serializable)),
                    }
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_seq!(Vec, VecDeque, HashSet, BTreeSet);

macro_rules! impl_map {
    ($($container:ident),* $(,)?) => {
        $(
            impl<K, V> Serializable for $container<K, V>
            where
                K: fmt::Display + Send + Sync + 'static,
                V: Serializable,
            {
                fn kind(&self) -> Kind<'_> {
                    Kind::Map {
                        element: V::declared_type(),
                        entries: Box::new(
                            self.iter().map(|(k, v)| (k.to_string(), v as &dyn Serializable)),
                        ),
                    }
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_map!(HashMap, BTreeMap, IndexMap);
