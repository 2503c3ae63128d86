//! Type descriptors and their registry
//!
//! A [`TypeDescriptor`] lists the members of a structured type in field
//! order. Descriptors are built once per type, shared through `Arc`, and
//! never mutated after insertion.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::document::{DocValue, ID_FIELD};
use crate::observability::Event;

use super::errors::{MapperError, MapperResult};
use super::kind::{Serializable, TypeKey};
use super::serialize::DocumentMapper;

/// Reads one member out of its owner
pub type Getter = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Serializable> + Send + Sync>;

/// Per-member override; receives the owner and the mapper in use
pub type MemberSerializer = Box<dyn Fn(&dyn Any, &DocumentMapper) -> MapperResult<DocValue> + Send + Sync>;

/// A structured type with a hand-written member list
pub trait Entity: Any + Send + Sync {
    fn describe() -> TypeDescriptor;
}

/// One member of a structured type
pub struct Member {
    field_name: String,
    data_type: TypeKey,
    getter: Option<Getter>,
    serialize: Option<MemberSerializer>,
}

impl Member {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Declared type of the member
    pub fn data_type(&self) -> TypeKey {
        self.data_type
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_id(&self) -> bool {
        self.field_name == ID_FIELD
    }

    pub(crate) fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Serializable> {
        self.getter.as_ref().and_then(|get| get(owner))
    }

    pub(crate) fn serializer(&self) -> Option<&MemberSerializer> {
        self.serialize.as_ref()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("field_name", &self.field_name)
            .field("data_type", &self.data_type)
            .field("readable", &self.getter.is_some())
            .field("custom", &self.serialize.is_some())
            .finish()
    }
}

/// Member list of one concrete type
#[derive(Debug)]
pub struct TypeDescriptor {
    type_key: TypeKey,
    members: Vec<Member>,
}

impl TypeDescriptor {
    pub fn builder<T: Any>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            type_key: TypeKey::of::<T>(),
            members: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Descriptor with no members
    pub fn empty(type_key: TypeKey) -> Self {
        Self {
            type_key,
            members: Vec::new(),
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, field_name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.field_name == field_name)
    }

    /// Members that have a getter, in declaration order
    pub fn readable(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_readable())
    }
}

fn getter_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Serializable> + Send + Sync + 'static,
{
    f
}

fn getter<T: Any, F: Serializable>(get: fn(&T) -> &F) -> Getter {
    Box::new(getter_fn(move |owner| {
        owner
            .downcast_ref::<T>()
            .map(|t| get(t) as &dyn Serializable)
    }))
}

/// Builds a [`TypeDescriptor`] for `T`
pub struct DescriptorBuilder<T> {
    type_key: TypeKey,
    members: Vec<Member>,
    _owner: PhantomData<fn(&T)>,
}

impl<T: Any> DescriptorBuilder<T> {
    /// The identity member, stored as `_id`
    pub fn id<F: Serializable>(self, get: fn(&T) -> &F) -> Self {
        self.field(ID_FIELD, get)
    }

    /// A member declared as its own static type
    pub fn field<F: Serializable>(self, name: &str, get: fn(&T) -> &F) -> Self {
        self.field_as(name, F::declared_type(), get)
    }

    /// A member with an explicit declared type.
    ///
    /// A declared type that differs from the runtime type of a structured
    /// value stamps `_type` on it.
    pub fn field_as<F: Serializable>(mut self, name: &str, data_type: TypeKey, get: fn(&T) -> &F) -> Self {
        self.members.push(Member {
            field_name: name.to_string(),
            data_type,
            getter: Some(getter(get)),
            serialize: None,
        });
        self
    }

    /// A member written by `serialize` instead of the mapper
    pub fn field_with<F, S>(mut self, name: &str, get: fn(&T) -> &F, serialize: S) -> Self
    where
        F: Serializable,
        S: Fn(&F, &DocumentMapper) -> MapperResult<DocValue> + Send + Sync + 'static,
    {
        let hook: MemberSerializer = Box::new(move |owner: &dyn Any, mapper: &DocumentMapper| {
            match owner.downcast_ref::<T>() {
                Some(t) => serialize(get(t), mapper),
                None => Err(MapperError::InvalidArgument(format!(
                    "member serializer expects {}",
                    type_name::<T>()
                ))),
            }
        });
        self.members.push(Member {
            field_name: name.to_string(),
            data_type: F::declared_type(),
            getter: Some(getter(get)),
            serialize: Some(hook),
        });
        self
    }

    /// A member that is never read during serialization
    pub fn write_only(mut self, name: &str, data_type: TypeKey) -> Self {
        self.members.push(Member {
            field_name: name.to_string(),
            data_type,
            getter: None,
            serialize: None,
        });
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            type_key: self.type_key,
            members: self.members,
        }
    }
}

/// Read-mostly cache of descriptors keyed by type.
///
/// A miss is built outside the lock. Two callers racing on the same miss
/// both build; the later insert wins and both results are equivalent.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: RwLock<HashMap<TypeKey, Arc<TypeDescriptor>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<DescriptorRegistry> {
        static GLOBAL: OnceLock<Arc<DescriptorRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(DescriptorRegistry::new())))
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Cached descriptor for `key`, building it with `build` on a miss
    pub fn descriptor_for<F>(&self, key: TypeKey, build: F) -> Arc<TypeDescriptor>
    where
        F: FnOnce() -> TypeDescriptor,
    {
        self.lookup(key, build).0
    }

    /// Like `descriptor_for`, also reporting whether the cache answered
    pub(crate) fn lookup<F>(&self, key: TypeKey, build: F) -> (Arc<TypeDescriptor>, bool)
    where
        F: FnOnce() -> TypeDescriptor,
    {
        if let Some(found) = self.get(&key) {
            return (found, true);
        }

        let built = Arc::new(build());
        self.descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&built));

        debug!(
            event = %Event::DescriptorCached,
            type_name = key.full_name(),
            members = built.members().len(),
        );
        (built, false)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Implements [`Serializable`] for structured types that implement [`Entity`].
///
/// ```ignore
/// struct User { id: i64, name: String }
///
/// impl Entity for User {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::builder::<User>()
///             .id(|u| &u.id)
///             .field("name", |u| &u.name)
///             .build()
///     }
/// }
///
/// impl_entity!(User);
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::mapper::Serializable for $ty {
                fn kind(&self) -> $crate::mapper::Kind<'_> {
                    $crate::mapper::Kind::Object
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn describe(&self) -> ::std::option::Option<$crate::mapper::TypeDescriptor> {
                    ::std::option::Option::Some(<$ty as $crate::mapper::Entity>::describe())
                }
            }
        )+
    };
}

/// Implements [`Serializable`] and
/// [`FromDocValue`](crate::mapper::FromDocValue) for enumerated labels.
///
/// The label is stored as its `Display` form and read back with `FromStr`.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status { Active, Closed }
///
/// // Display and FromStr impls omitted
///
/// impl_label!(Status);
/// ```
#[macro_export]
macro_rules! impl_label {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::mapper::Serializable for $ty {
                fn kind(&self) -> $crate::mapper::Kind<'_> {
                    $crate::mapper::Kind::Label(::std::borrow::Cow::Owned(::std::string::ToString::to_string(self)))
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }

            impl $crate::mapper::FromDocValue for $ty {
                fn from_doc_value(
                    value: &$crate::document::DocValue,
                    _: &$crate::mapper::DocumentMapper,
                ) -> $crate::mapper::MapperResult<Self> {
                    value
                        .as_str()
                        .and_then(|s| s.parse::<$ty>().ok())
                        .ok_or_else(|| $crate::mapper::MapperError::type_mismatch(::std::any::type_name::<$ty>(), value))
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Point {
        x: i32,
        y: i32,
    }

    fn point_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Point>()
            .field("x", |p| &p.x)
            .field("y", |p| &p.y)
            .write_only("tag", TypeKey::of::<String>())
            .build()
    }

    #[test]
    fn test_builder_keeps_order() {
        let descriptor = point_descriptor();
        let names: Vec<&str> = descriptor.members().iter().map(|m| m.field_name()).collect();
        assert_eq!(names, vec!["x", "y", "tag"]);
        assert_eq!(descriptor.readable().count(), 2);
        assert_eq!(descriptor.type_key(), TypeKey::of::<Point>());
    }

    #[test]
    fn test_getter_reads_member() {
        let descriptor = point_descriptor();
        let point = Point { x: 3, y: 4 };
        let y = descriptor.member("y").unwrap().read(&point).unwrap();
        assert_eq!(y.as_any().downcast_ref::<i32>(), Some(&4));

        // Wrong owner type yields nothing
        assert!(descriptor.member("x").unwrap().read(&5u8).is_none());
        assert!(descriptor.member("tag").unwrap().read(&point).is_none());
    }

    #[test]
    fn test_registry_builds_once() {
        let registry = DescriptorRegistry::new();
        let key = TypeKey::of::<Point>();

        let (_, hit) = registry.lookup(key, point_descriptor);
        assert!(!hit);
        let (_, hit) = registry.lookup(key, || panic!("must not rebuild"));
        assert!(hit);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&key));
    }

    #[test]
    fn test_registry_concurrent_misses() {
        let registry = Arc::new(DescriptorRegistry::new());
        let key = TypeKey::of::<Point>();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.descriptor_for(key, point_descriptor).members().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        let a = DescriptorRegistry::global();
        let b = DescriptorRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
