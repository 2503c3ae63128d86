//! Document serialization engine
//!
//! [`DocumentMapper::serialize`] walks a value by its [`Kind`], strictly in
//! this order:
//!
//! 1. Depth guard
//! 2. Null
//! 3. Existing document values, copied
//! 4. Scalars, with the string transforms applied to strings only
//! 5. Narrow integers widened; `u64` reinterpreted as `i64`
//! 6. Chars and labels as strings
//! 7. Custom serializer for the declared type, then the runtime type
//! 8. Maps, sequences, then structured objects

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::{DocValue, Document, TYPE_FIELD};
use crate::observability::{Event, MetricsRegistry};

use super::config::MapperConfig;
use super::deserialize::{construct, Constructor, FromDocument};
use super::descriptor::{DescriptorRegistry, TypeDescriptor};
use super::errors::{BoxError, MapperError, MapperResult};
use super::kind::{Kind, Serializable, TypeKey};

/// Serializer registered for one type; receives the raw value
pub type CustomSerializer = Arc<dyn Fn(&dyn Any) -> Result<DocValue, BoxError> + Send + Sync>;

/// Converts typed values to documents and back.
///
/// Immutable once built, so one mapper can be shared across threads without
/// locking. The descriptor registry is the only shared mutable state.
pub struct DocumentMapper {
    config: MapperConfig,
    serializers: HashMap<TypeKey, CustomSerializer>,
    pub(crate) types: HashMap<String, Constructor>,
    registry: Arc<DescriptorRegistry>,
    metrics: MetricsRegistry,
}

impl Default for DocumentMapper {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DocumentMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder {
            config: MapperConfig::default(),
            serializers: HashMap::new(),
            types: HashMap::new(),
            registry: None,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Serializes `value` as a document, declared as its own static type.
    pub fn to_document<T: Serializable>(&self, value: &T) -> MapperResult<Document> {
        self.to_document_as(T::declared_type(), value)
    }

    /// Serializes `value` as a document through a slot declared as `declared`.
    ///
    /// A `Document` is returned as a copy without re-deriving it.
    pub fn to_document_as(&self, declared: TypeKey, value: &dyn Serializable) -> MapperResult<Document> {
        if value.is_absent() {
            return Err(MapperError::InvalidArgument("entity cannot be null".to_string()));
        }
        if let Kind::Document(doc) = value.kind() {
            return Ok(doc.clone());
        }

        match self.serialize(declared, value, 0)? {
            DocValue::Document(doc) => {
                self.metrics.increment_documents_serialized();
                Ok(doc)
            }
            other => Err(MapperError::NotADocument(other.type_name())),
        }
    }

    /// Serializes any value, declared as its own static type
    pub fn to_value<T: Serializable>(&self, value: &T) -> MapperResult<DocValue> {
        self.serialize(T::declared_type(), value, 0)
    }

    /// Recursive workhorse. `depth` is the depth of the caller.
    pub fn serialize(&self, declared: TypeKey, value: &dyn Serializable, depth: usize) -> MapperResult<DocValue> {
        let depth = depth + 1;
        let max = self.config.max_serialization_depth;
        if depth > max {
            self.metrics.increment_depth_exceeded();
            warn!(
                event = %Event::SerializeDepthExceeded,
                type_name = declared.full_name(),
                max,
            );
            return Err(MapperError::DepthExceeded {
                type_name: declared.full_name(),
                max,
            });
        }

        Ok(match value.kind() {
            Kind::Null => DocValue::Null,
            Kind::Value(v) => v.clone(),
            Kind::Document(doc) => DocValue::Document(doc.clone()),
            Kind::String(s) => self.string_value(s),
            Kind::Int32(v) => DocValue::Int32(v),
            Kind::Int64(v) => DocValue::Int64(v),
            Kind::Double(v) => DocValue::Double(v),
            Kind::Decimal(v) => DocValue::Decimal(v),
            Kind::Binary(bytes) => DocValue::Binary(bytes.to_vec()),
            Kind::ObjectId(v) => DocValue::ObjectId(v),
            Kind::Guid(v) => DocValue::Guid(v),
            Kind::Boolean(v) => DocValue::Boolean(v),
            Kind::DateTime(v) => DocValue::DateTime(v),
            Kind::Int16(v) => DocValue::Int32(i32::from(v)),
            Kind::UInt16(v) => DocValue::Int32(i32::from(v)),
            Kind::Int8(v) => DocValue::Int32(i32::from(v)),
            Kind::UInt8(v) => DocValue::Int32(i32::from(v)),
            Kind::UInt32(v) => DocValue::Int64(i64::from(v)),
            // Bit reinterpretation: values above i64::MAX come out negative
            Kind::UInt64(v) => DocValue::Int64(v as i64),
            Kind::Single(v) => DocValue::Double(f64::from(v)),
            Kind::Char(c) => DocValue::String(c.to_string()),
            Kind::Label(label) => DocValue::String(label.into_owned()),
            structured => {
                if let Some(custom) = self.custom_serializer(declared, value.type_key()) {
                    return custom(value.as_any()).map_err(|err| {
                        debug!(
                            event = %Event::CustomSerializerFailed,
                            type_name = value.type_key().full_name(),
                            error = %err,
                        );
                        MapperError::Custom(err)
                    });
                }
                match structured {
                    Kind::Map { element, entries } => {
                        let mut doc = Document::new();
                        for (key, item) in entries {
                            doc.insert(key, self.serialize(element, item, depth)?);
                        }
                        DocValue::Document(doc)
                    }
                    Kind::Seq { element, items } => DocValue::Array(
                        items
                            .map(|item| self.serialize(element, item, depth))
                            .collect::<MapperResult<Vec<_>>>()?,
                    ),
                    _ => DocValue::Document(self.serialize_object(declared, value, depth)?),
                }
            }
        })
    }

    fn string_value(&self, s: &str) -> DocValue {
        let s = if self.config.trim_whitespace { s.trim() } else { s };
        if self.config.empty_string_to_null && s.is_empty() {
            DocValue::Null
        } else {
            DocValue::String(s.to_string())
        }
    }

    fn custom_serializer(&self, declared: TypeKey, runtime: TypeKey) -> Option<&CustomSerializer> {
        self.serializers
            .get(&declared)
            .or_else(|| self.serializers.get(&runtime))
    }

    /// Cached descriptor of the runtime type of `value`
    pub fn descriptor_of(&self, value: &dyn Serializable) -> Arc<TypeDescriptor> {
        let key = value.type_key();
        let (descriptor, hit) = self.registry.lookup(key, || {
            value.describe().unwrap_or_else(|| TypeDescriptor::empty(key))
        });
        self.metrics.record_descriptor_lookup(hit);
        descriptor
    }

    fn serialize_object(&self, declared: TypeKey, value: &dyn Serializable, depth: usize) -> MapperResult<Document> {
        let runtime = value.type_key();
        let descriptor = self.descriptor_of(value);
        let owner = value.as_any();

        let mut doc = Document::with_capacity(descriptor.members().len() + 1);

        // Polymorphic slot: record the concrete type
        if declared != runtime {
            doc.insert(TYPE_FIELD, runtime.discriminator());
        }

        for member in descriptor.readable() {
            let Some(field) = member.read(owner) else {
                return Err(MapperError::InvalidArgument(format!(
                    "descriptor of {} does not match value of {}",
                    descriptor.type_key(),
                    runtime
                )));
            };

            if field.is_absent() && !self.config.serialize_null_values && !member.is_id() {
                continue;
            }

            let serialized = match member.serializer() {
                Some(custom) => custom(owner, self)?,
                None => self.serialize(member.data_type(), field, depth)?,
            };
            doc.insert(member.field_name(), serialized);
        }

        Ok(doc)
    }
}

/// Configures a [`DocumentMapper`]. All registration happens here, before
/// the mapper is shared.
pub struct MapperBuilder {
    config: MapperConfig,
    serializers: HashMap<TypeKey, CustomSerializer>,
    types: HashMap<String, Constructor>,
    registry: Option<Arc<DescriptorRegistry>>,
}

impl MapperBuilder {
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `registry` instead of the process-wide one
    pub fn registry(mut self, registry: Arc<DescriptorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Serializes every `T` with `serialize`, ahead of structural handling.
    ///
    /// Errors returned by `serialize` reach the caller unchanged inside
    /// [`MapperError::Custom`].
    pub fn register_serializer<T, E, F>(self, serialize: F) -> Self
    where
        T: Any,
        E: Into<BoxError>,
        F: Fn(&T) -> Result<DocValue, E> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        self.register_raw_serializer(key, move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(v) => serialize(v).map_err(Into::into),
            None => Err(format!("serializer for {} received another type", key).into()),
        })
    }

    /// Serializer keyed by an explicit type key, fed the untyped value
    pub fn register_raw_serializer<F>(mut self, key: TypeKey, serialize: F) -> Self
    where
        F: Fn(&dyn Any) -> Result<DocValue, BoxError> + Send + Sync + 'static,
    {
        self.serializers.insert(key, Arc::new(serialize));
        self
    }

    /// Makes `T` constructible from its `_type` discriminator
    pub fn register_type<T>(mut self) -> Self
    where
        T: FromDocument + Serializable,
    {
        self.types
            .insert(TypeKey::of::<T>().discriminator(), construct::<T>);
        self
    }

    pub fn build(self) -> DocumentMapper {
        DocumentMapper {
            config: self.config,
            serializers: self.serializers,
            types: self.types,
            registry: self.registry.unwrap_or_else(DescriptorRegistry::global),
            metrics: MetricsRegistry::new(),
        }
    }
}
