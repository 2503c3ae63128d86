//! Extended JSON for document values
//!
//! Types JSON cannot express natively are wrapped in single-key objects:
//!
//! | value    | JSON                                   |
//! |----------|----------------------------------------|
//! | Int64    | `{"$numberLong": "9000000000"}`        |
//! | Decimal  | `{"$numberDecimal": "1.50"}`           |
//! | Binary   | `{"$binary": "<base64>"}`              |
//! | DateTime | `{"$date": "<rfc3339>"}`               |
//! | ObjectId | `{"$oid": "<24 hex>"}`                 |
//! | Guid     | `{"$guid": "<hyphenated>"}`            |
//! | NaN/±Inf | `{"$numberDouble": "NaN"}`             |

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::document::Document;
use super::errors::{DocumentError, DocumentResult};
use super::object_id::ObjectId;
use super::value::DocValue;

/// Converts a value to extended JSON
pub fn to_json(value: &DocValue) -> Value {
    match value {
        DocValue::Null => Value::Null,
        DocValue::String(s) => Value::String(s.clone()),
        DocValue::Int32(v) => Value::Number((*v).into()),
        DocValue::Int64(v) => wrap("$numberLong", v.to_string()),
        DocValue::Double(v) => match Number::from_f64(*v) {
            Some(n) => Value::Number(n),
            None => wrap("$numberDouble", non_finite_label(*v)),
        },
        DocValue::Decimal(d) => wrap("$numberDecimal", d.to_string()),
        DocValue::Boolean(b) => Value::Bool(*b),
        DocValue::Binary(bytes) => wrap("$binary", STANDARD.encode(bytes)),
        DocValue::DateTime(dt) => wrap("$date", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        DocValue::ObjectId(oid) => wrap("$oid", oid.to_hex()),
        DocValue::Guid(g) => wrap("$guid", g.hyphenated().to_string()),
        DocValue::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        DocValue::Document(doc) => document_to_json(doc),
    }
}

/// Converts a document to an extended JSON object
pub fn document_to_json(doc: &Document) -> Value {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        map.insert(key.clone(), to_json(value));
    }
    Value::Object(map)
}

/// Parses extended JSON into a value
pub fn from_json(json: &Value) -> DocumentResult<DocValue> {
    Ok(match json {
        Value::Null => DocValue::Null,
        Value::Bool(b) => DocValue::Boolean(*b),
        Value::Number(n) => number_from_json(n)?,
        Value::String(s) => DocValue::String(s.clone()),
        Value::Array(items) => DocValue::Array(
            items
                .iter()
                .map(from_json)
                .collect::<DocumentResult<Vec<_>>>()?,
        ),
        Value::Object(map) => match extended_wrapper(map) {
            Some((tag, payload)) => parse_wrapper(tag, payload)?,
            None => DocValue::Document(object_from_json(map)?),
        },
    })
}

/// Parses an extended JSON object into a document
pub fn document_from_json(json: &Value) -> DocumentResult<Document> {
    match from_json(json)? {
        DocValue::Document(doc) => Ok(doc),
        other => Err(DocumentError::InvalidJson(format!(
            "expected an object, found {}",
            other.type_name()
        ))),
    }
}

fn wrap(tag: &str, payload: String) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), Value::String(payload));
    Value::Object(map)
}

fn non_finite_label(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_sign_positive() {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

fn number_from_json(n: &Number) -> DocumentResult<DocValue> {
    if let Some(i) = n.as_i64() {
        return Ok(match i32::try_from(i) {
            Ok(small) => DocValue::Int32(small),
            Err(_) => DocValue::Int64(i),
        });
    }
    n.as_f64()
        .map(DocValue::Double)
        .ok_or_else(|| DocumentError::InvalidJson(format!("number out of range: {}", n)))
}

fn extended_wrapper(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    key.starts_with('$').then_some((key.as_str(), value))
}

fn parse_wrapper(tag: &str, payload: &Value) -> DocumentResult<DocValue> {
    let text = payload
        .as_str()
        .ok_or_else(|| DocumentError::InvalidJson(format!("{} expects a string payload", tag)))?;
    let invalid = |reason: String| DocumentError::InvalidJson(format!("{}: {}", tag, reason));

    match tag {
        "$numberLong" => text
            .parse::<i64>()
            .map(DocValue::Int64)
            .map_err(|e| invalid(e.to_string())),
        "$numberDecimal" => Decimal::from_str(text)
            .map(DocValue::Decimal)
            .map_err(|e| invalid(e.to_string())),
        "$numberDouble" => match text {
            "NaN" => Ok(DocValue::Double(f64::NAN)),
            "Infinity" => Ok(DocValue::Double(f64::INFINITY)),
            "-Infinity" => Ok(DocValue::Double(f64::NEG_INFINITY)),
            other => other
                .parse::<f64>()
                .map(DocValue::Double)
                .map_err(|e| invalid(e.to_string())),
        },
        "$binary" => STANDARD
            .decode(text)
            .map(DocValue::Binary)
            .map_err(|e| invalid(e.to_string())),
        "$date" => DateTime::parse_from_rfc3339(text)
            .map(|dt| DocValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| invalid(e.to_string())),
        "$oid" => ObjectId::from_str(text).map(DocValue::ObjectId),
        "$guid" => Uuid::parse_str(text)
            .map(DocValue::Guid)
            .map_err(|e| invalid(e.to_string())),
        other => Err(DocumentError::InvalidJson(format!(
            "unknown extended type {}",
            other
        ))),
    }
}

fn object_from_json(map: &Map<String, Value>) -> DocumentResult<Document> {
    let mut doc = Document::with_capacity(map.len());
    for (key, value) in map {
        doc.insert(key.clone(), from_json(value)?);
    }
    Ok(doc)
}
