//! Row and document containers.
//!
//! The column set of a migrated table is only known once the source
//! catalog has been read, so both sides are modelled as ordered maps from
//! column name to a small tagged union instead of fixed structs.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Source side
// ---------------------------------------------------------------------------

/// A raw scalar as returned by the relational driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SourceValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Narrow the text form of a decimal to the tightest lossless value.
    ///
    /// Integral values that fit an `i64` become [`SourceValue::Integer`],
    /// including ones written with a zero fraction such as `42.000`. Other
    /// parseable numbers become [`SourceValue::Float`]; anything else is
    /// kept as text so no digits are lost.
    pub fn from_numeric_text(text: &str) -> Self {
        let text = text.trim();
        let whole = match text.split_once('.') {
            Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
            Some(_) => {
                return match text.parse::<f64>() {
                    Ok(f) if f.is_finite() => Self::Float(f),
                    _ => Self::Text(text.to_string()),
                }
            }
            None => text,
        };

        match whole.parse::<i64>() {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    /// Render the value the way it would print, `None` for SQL `NULL`.
    pub fn render(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
            Self::Text(s) => Some(Cow::Borrowed(s)),
        }
    }
}

impl From<&str> for SourceValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SourceValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for SourceValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One row of the source table, keyed by the discovered column names in
/// catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    values: IndexMap<String, SourceValue>,
}

impl SourceRow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: IndexMap::with_capacity(capacity),
        }
    }

    /// Append a column value. A repeated column name replaces the earlier
    /// value in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SourceValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&SourceValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for SourceRow {
    type Item = (String, SourceValue);
    type IntoIter = indexmap::map::IntoIter<String, SourceValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>, V: Into<SourceValue>> FromIterator<(K, V)> for SourceRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::default();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// Document side
// ---------------------------------------------------------------------------

/// A value stored in a target document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
    Map(Document),
}

impl DocValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Self::Map(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<SourceValue> for DocValue {
    fn from(value: SourceValue) -> Self {
        match value {
            SourceValue::Null => Self::Null,
            SourceValue::Integer(i) => Self::Integer(i),
            SourceValue::Float(f) => Self::Float(f),
            SourceValue::Text(s) => Self::Text(s),
        }
    }
}

impl From<Option<Timestamp>> for DocValue {
    fn from(value: Option<Timestamp>) -> Self {
        value.map_or(Self::Null, Self::Timestamp)
    }
}

impl From<Document> for DocValue {
    fn from(doc: Document) -> Self {
        Self::Map(doc)
    }
}

/// An ordered document ready to be written to the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(IndexMap<String, DocValue>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DocValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DocValue> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Document {
    type Item = (String, DocValue);
    type IntoIter = indexmap::map::IntoIter<String, DocValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
