//! Document model for folio
//!
//! Records are decoded generically into [`Document`]s, whose accessors are
//! fallible rather than assuming a field's shape.
//!
//! # Missing and mismatched fields
//!
//! - `field_value` / `tags` are strict: absent fields, arrays/objects where a
//!   scalar is expected, or non-string tags are `DecodeError`. Index
//!   rebuilds use these.
//! - `matches` / `has_all_tags` are lenient: such records simply do not
//!   match. Scans use these.

mod codec;
mod value;

pub use codec::{JsonCodec, RecordCodec};
pub use value::FieldValue;

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::TAGS_FIELD;
use crate::errors::{DbError, DbResult};

/// A decoded record: a mapping of field name to value
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Wrap a decoded value; the top level must be an object
    pub fn from_value(value: Value) -> DbResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(DbError::decode(format!(
                "record must be an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Raw field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Scalar value of a field, strictly
    pub fn field_value(&self, field: &str) -> DbResult<FieldValue> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| DbError::decode(format!("field {:?} is missing", field)))?;
        FieldValue::from_json(value).ok_or_else(|| {
            DbError::decode(format!(
                "field {:?} is {}, expected a scalar",
                field,
                json_kind(value)
            ))
        })
    }

    /// Whether a field is present and equal to `expected`
    pub fn matches(&self, field: &str, expected: &FieldValue) -> bool {
        self.fields
            .get(field)
            .and_then(FieldValue::from_json)
            .map_or(false, |v| &v == expected)
    }

    /// The record's tags, strictly
    pub fn tags(&self) -> DbResult<Vec<String>> {
        let value = self
            .fields
            .get(TAGS_FIELD)
            .ok_or_else(|| DbError::decode("field \"tags\" is missing"))?;
        let items = value.as_array().ok_or_else(|| {
            DbError::decode(format!("field \"tags\" is {}, expected an array", json_kind(value)))
        })?;
        items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    DbError::decode(format!("tag is {}, expected a string", json_kind(item)))
                })
            })
            .collect()
    }

    /// Whether every tag in `wanted` is among this record's tags.
    ///
    /// Records with missing or malformed tags never match, and an empty
    /// `wanted` set never matches.
    pub fn has_all_tags(&self, wanted: &HashSet<&str>) -> bool {
        if wanted.is_empty() {
            return false;
        }
        match self.tags() {
            Ok(tags) => {
                let own: HashSet<&str> = tags.iter().map(String::as_str).collect();
                wanted.iter().all(|t| own.contains(t))
            }
            Err(_) => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
