//! Document Mapper Round-Trip Tests
//!
//! Tests for reading serialized documents back into typed values:
//! - Every scalar kind survives a write and a read
//! - Widened integers narrow back, u64 keeps its bits
//! - Values stored through `object` slots are rebuilt from `_type`
//! - Type errors name the offending field path

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use aerodoc::document::{DocValue, Document, ObjectId, TYPE_FIELD};
use aerodoc::mapper::{
    Binary, DescriptorRegistry, DocumentMapper, Entity, FromDocument, MapperConfig, MapperError,
    MapperResult, Serializable, TypeDescriptor,
};
use aerodoc::{impl_entity, impl_from_document};

// =============================================================================
// Fixture Types
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    id: ObjectId,
    int32: i32,
    int64: i64,
    double: f64,
    decimal: Decimal,
    bytes: Binary,
    guid: Uuid,
    flag: bool,
    created: chrono::DateTime<Utc>,
    int16: i16,
    uint16: u16,
    int8: i8,
    uint8: u8,
    uint32: u32,
    uint64: u64,
    single: f32,
    letter: char,
    text: String,
    maybe: Option<i32>,
    numbers: Vec<i64>,
    labels: HashMap<String, String>,
}

impl Entity for Sample {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Sample>()
            .id(|s| &s.id)
            .field("int32", |s| &s.int32)
            .field("int64", |s| &s.int64)
            .field("double", |s| &s.double)
            .field("decimal", |s| &s.decimal)
            .field("bytes", |s| &s.bytes)
            .field("guid", |s| &s.guid)
            .field("flag", |s| &s.flag)
            .field("created", |s| &s.created)
            .field("int16", |s| &s.int16)
            .field("uint16", |s| &s.uint16)
            .field("int8", |s| &s.int8)
            .field("uint8", |s| &s.uint8)
            .field("uint32", |s| &s.uint32)
            .field("uint64", |s| &s.uint64)
            .field("single", |s| &s.single)
            .field("letter", |s| &s.letter)
            .field("text", |s| &s.text)
            .field("maybe", |s| &s.maybe)
            .field("numbers", |s| &s.numbers)
            .field("labels", |s| &s.labels)
            .build()
    }
}

impl FromDocument for Sample {
    fn from_document(doc: &Document, m: &DocumentMapper) -> MapperResult<Self> {
        Ok(Sample {
            id: m.field(doc, "_id")?,
            int32: m.field(doc, "int32")?,
            int64: m.field(doc, "int64")?,
            double: m.field(doc, "double")?,
            decimal: m.field(doc, "decimal")?,
            bytes: m.field(doc, "bytes")?,
            guid: m.field(doc, "guid")?,
            flag: m.field(doc, "flag")?,
            created: m.field(doc, "created")?,
            int16: m.field(doc, "int16")?,
            uint16: m.field(doc, "uint16")?,
            int8: m.field(doc, "int8")?,
            uint8: m.field(doc, "uint8")?,
            uint32: m.field(doc, "uint32")?,
            uint64: m.field(doc, "uint64")?,
            single: m.field(doc, "single")?,
            letter: m.field(doc, "letter")?,
            text: m.field(doc, "text")?,
            maybe: m.field(doc, "maybe")?,
            numbers: m.field(doc, "numbers")?,
            labels: m.field(doc, "labels")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Circle {
    radius: f64,
}

impl Entity for Circle {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Circle>()
            .field("radius", |c| &c.radius)
            .build()
    }
}

impl FromDocument for Circle {
    fn from_document(doc: &Document, m: &DocumentMapper) -> MapperResult<Self> {
        Ok(Circle {
            radius: m.field(doc, "radius")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Square {
    side: u32,
}

impl Entity for Square {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Square>()
            .field("side", |s| &s.side)
            .build()
    }
}

impl FromDocument for Square {
    fn from_document(doc: &Document, m: &DocumentMapper) -> MapperResult<Self> {
        Ok(Square {
            side: m.field(doc, "side")?,
        })
    }
}

struct Drawing {
    title: String,
    main: Box<dyn Serializable>,
    shapes: Vec<Box<dyn Serializable>>,
}

impl Entity for Drawing {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Drawing>()
            .field("title", |d| &d.title)
            .field("main", |d| &d.main)
            .field("shapes", |d| &d.shapes)
            .build()
    }
}

impl FromDocument for Drawing {
    fn from_document(doc: &Document, m: &DocumentMapper) -> MapperResult<Self> {
        Ok(Drawing {
            title: m.field(doc, "title")?,
            main: m.field(doc, "main")?,
            shapes: m.field(doc, "shapes")?,
        })
    }
}

impl_entity!(Sample, Circle, Square, Drawing);
impl_from_document!(Sample, Circle, Square);

// =============================================================================
// Helper Functions
// =============================================================================

fn sample() -> Sample {
    let mut labels = HashMap::new();
    labels.insert("env".to_string(), "prod".to_string());

    Sample {
        id: ObjectId::new(),
        int32: -7,
        int64: 1 << 40,
        double: 2.5,
        decimal: Decimal::new(12345, 2),
        bytes: Binary(vec![0, 1, 2, 255]),
        guid: Uuid::new_v4(),
        flag: true,
        created: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        int16: i16::MIN,
        uint16: u16::MAX,
        int8: -128,
        uint8: 200,
        uint32: u32::MAX,
        uint64: u64::MAX,
        single: 1.5,
        letter: 'q',
        text: "hello".to_string(),
        maybe: Some(3),
        numbers: vec![1, 2, 3],
        labels,
    }
}

fn mapper() -> DocumentMapper {
    DocumentMapper::builder()
        .registry(Arc::new(DescriptorRegistry::new()))
        .register_type::<Circle>()
        .register_type::<Square>()
        .build()
}

fn drawing() -> Drawing {
    Drawing {
        title: "shapes".to_string(),
        main: Box::new(Circle { radius: 1.25 }),
        shapes: vec![Box::new(Square { side: 4 }), Box::new(Circle { radius: 3.0 })],
    }
}

// =============================================================================
// Scalar Round-Trip Tests
// =============================================================================

/// Every member comes back equal to what went in
#[test]
fn test_all_scalars_round_trip() {
    let m = mapper();
    let original = sample();

    let doc = m.to_document(&original).unwrap();
    let back: Sample = m.to_object(&doc).unwrap();
    assert_eq!(back, original);
}

/// Stored shapes of the widened members
#[test]
fn test_widened_storage() {
    let doc = mapper().to_document(&sample()).unwrap();

    assert_eq!(doc.get("int16"), Some(&DocValue::Int32(i32::from(i16::MIN))));
    assert_eq!(doc.get("uint8"), Some(&DocValue::Int32(200)));
    assert_eq!(doc.get("uint32"), Some(&DocValue::Int64(i64::from(u32::MAX))));
    assert_eq!(doc.get("uint64"), Some(&DocValue::Int64(-1)));
    assert_eq!(doc.get("single"), Some(&DocValue::Double(1.5)));
    assert_eq!(doc.get("letter"), Some(&DocValue::String("q".to_string())));
}

/// A missing optional member reads back as None
#[test]
fn test_absent_option_round_trips() {
    let m = mapper();
    let mut original = sample();
    original.maybe = None;

    let doc = m.to_document(&original).unwrap();
    assert!(!doc.contains_key("maybe"));
    let back: Sample = m.to_object(&doc).unwrap();
    assert_eq!(back.maybe, None);
}

/// Empty text is stored as null and reads back as empty
#[test]
fn test_empty_text_round_trips() {
    let m = mapper();
    let mut original = sample();
    original.text = String::new();

    let doc = m.to_document(&original).unwrap();
    assert_eq!(doc.get("text"), Some(&DocValue::Null));
    let back: Sample = m.to_object(&doc).unwrap();
    assert_eq!(back.text, "");

    // With the transforms off the empty string is stored as is
    let raw = DocumentMapper::builder()
        .config(MapperConfig::raw_strings())
        .registry(Arc::new(DescriptorRegistry::new()))
        .build();
    let doc = raw.to_document(&original).unwrap();
    assert_eq!(doc.get("text"), Some(&DocValue::String(String::new())));
}

// =============================================================================
// Polymorphic Round-Trip Tests
// =============================================================================

/// `object` slots are rebuilt as their registered concrete types
#[test]
fn test_polymorphic_members_rebuilt() {
    let m = mapper();
    let doc = m.to_document(&drawing()).unwrap();
    let back: Drawing = m.to_object(&doc).unwrap();

    assert_eq!(back.title, "shapes");
    assert_eq!(
        back.main.as_any().downcast_ref::<Circle>(),
        Some(&Circle { radius: 1.25 })
    );
    assert_eq!(back.shapes.len(), 2);
    assert_eq!(
        back.shapes[0].as_any().downcast_ref::<Square>(),
        Some(&Square { side: 4 })
    );
    assert_eq!(
        back.shapes[1].as_any().downcast_ref::<Circle>(),
        Some(&Circle { radius: 3.0 })
    );

    // Serializing the rebuilt value reproduces the document
    assert_eq!(m.to_document(&back).unwrap(), doc);
}

/// A root stored as `object` can be rebuilt without naming its type
#[test]
fn test_dynamic_root() {
    let m = mapper();
    let doc = m
        .to_document_as(<Box<dyn Serializable>>::declared_type(), &Square { side: 9 })
        .unwrap();
    assert!(doc.contains_key(TYPE_FIELD));

    let back = m.to_object_dyn(&doc).unwrap();
    assert_eq!(back.as_any().downcast_ref::<Square>(), Some(&Square { side: 9 }));
}

/// A discriminator nobody registered is rejected
#[test]
fn test_unregistered_type_rejected() {
    let m = DocumentMapper::builder()
        .registry(Arc::new(DescriptorRegistry::new()))
        .register_type::<Circle>()
        .build();

    let doc = m.to_document(&drawing()).unwrap();
    let err = m.to_object::<Drawing>(&doc).map(|_| ()).unwrap_err();
    assert_eq!(err.code(), "AERO_UNKNOWN_TYPE");
}

/// Plain values in an `object` slot come back as raw values
#[test]
fn test_untyped_values_stay_raw() {
    let m = mapper();
    let drawing = Drawing {
        title: "raw".to_string(),
        main: Box::new(42i32),
        shapes: vec![Box::new("label".to_string())],
    };

    let doc = m.to_document(&drawing).unwrap();
    let back: Drawing = m.to_object(&doc).unwrap();
    assert_eq!(back.main.as_any().downcast_ref::<DocValue>(), Some(&DocValue::Int32(42)));
    assert_eq!(
        back.shapes[0].as_any().downcast_ref::<DocValue>(),
        Some(&DocValue::from("label"))
    );
}

// =============================================================================
// Error Tests
// =============================================================================

/// A type mismatch names the field and both types
#[test]
fn test_mismatch_names_field() {
    let m = mapper();
    let mut doc = m.to_document(&sample()).unwrap();
    doc.insert("uint8", 300);

    match m.to_object::<Sample>(&doc) {
        Err(MapperError::TypeMismatch { path, expected, found }) => {
            assert_eq!(path, "uint8");
            assert_eq!(expected, "uint8");
            assert_eq!(found, "int32");
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}
