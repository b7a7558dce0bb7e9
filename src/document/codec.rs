//! Record codecs
//!
//! A codec turns a generic structured value into the bytes stored in a
//! record file and back. The store never looks inside the bytes.

use std::fmt;

use serde_json::Value;

use crate::errors::{DbError, DbResult};

/// Converts records to and from their stored form
pub trait RecordCodec: Send + Sync + fmt::Debug {
    /// Serialize a record
    fn encode(&self, value: &Value) -> DbResult<Vec<u8>>;

    /// Parse stored bytes into a generic value
    fn decode(&self, bytes: &[u8]) -> DbResult<Value>;
}

/// Compact JSON codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn encode(&self, value: &Value) -> DbResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| DbError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> DbResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| DbError::decode(format!("Invalid JSON: {}", e)))
    }
}
