//! Conversion between domain values and BSON.

use chrono::DateTime;
use citsm_core::types::Timestamp;
use citsm_core::value::{DocValue, Document};
use mongodb::bson::{self, Bson};

/// Convert a migrated document to BSON, keeping field order.
pub fn to_bson_document(doc: Document) -> bson::Document {
    let mut out = bson::Document::new();
    for (key, value) in doc {
        out.insert(key, to_bson(value));
    }
    out
}

/// Convert a single value. Timestamps become BSON dates with millisecond
/// precision.
pub fn to_bson(value: DocValue) -> Bson {
    match value {
        DocValue::Null => Bson::Null,
        DocValue::Integer(i) => Bson::Int64(i),
        DocValue::Float(f) => Bson::Double(f),
        DocValue::Text(s) => Bson::String(s),
        DocValue::Timestamp(ts) => Bson::DateTime(to_bson_datetime(ts)),
        DocValue::Map(doc) => Bson::Document(to_bson_document(doc)),
    }
}

pub fn to_bson_datetime(ts: Timestamp) -> bson::DateTime {
    bson::DateTime::from_millis(ts.timestamp_millis())
}

pub fn from_bson_datetime(dt: bson::DateTime) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
}

/// Read a scalar field as text. Numbers are rendered; anything else is
/// treated as absent.
pub fn field_text(doc: &bson::Document, key: &str) -> Option<String> {
    match doc.get(key)? {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        Bson::Double(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Read a numeric field as an integer.
pub fn field_int(doc: &bson::Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        Bson::Double(f) => Some(*f as i64),
        _ => None,
    }
}

/// Read a dotted path (`a.b`) holding a BSON date.
pub fn path_timestamp(doc: &bson::Document, path: &str) -> Option<Timestamp> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    match current {
        Bson::DateTime(dt) => from_bson_datetime(*dt),
        _ => None,
    }
}
