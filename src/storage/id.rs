//! Record identifiers
//!
//! An identifier is a positive integer rendered in canonical decimal: no
//! sign, no leading zeros, no whitespace. The rendered form is also the
//! record's file stem, so anything else is rejected before it can reach
//! the filesystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DbResult};

/// Identifier of a record within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RecordId(u64);

impl RecordId {
    /// The first identifier allocated in an empty table
    pub const FIRST: RecordId = RecordId(1);

    /// Create from a raw value; zero is not an identifier
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(RecordId(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The identifier after this one
    pub fn next(self) -> DbResult<Self> {
        self.0
            .checked_add(1)
            .map(RecordId)
            .ok_or_else(|| DbError::decode("record identifier space exhausted"))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        let invalid = || DbError::InvalidIdentifier(s.to_string());
        if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<u64>().map(RecordId).map_err(|_| invalid())
    }
}

impl TryFrom<u64> for RecordId {
    type Error = DbError;

    fn try_from(value: u64) -> DbResult<Self> {
        RecordId::new(value).ok_or_else(|| DbError::InvalidIdentifier(value.to_string()))
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> u64 {
        id.0
    }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool {
        other.parse::<RecordId>().map_or(false, |o| o == *self)
    }
}

/// Anything a caller may pass where an identifier is expected
pub trait IntoRecordId {
    fn into_record_id(self) -> DbResult<RecordId>;
}

impl IntoRecordId for RecordId {
    fn into_record_id(self) -> DbResult<RecordId> {
        Ok(self)
    }
}

impl IntoRecordId for &RecordId {
    fn into_record_id(self) -> DbResult<RecordId> {
        Ok(*self)
    }
}

impl IntoRecordId for &str {
    fn into_record_id(self) -> DbResult<RecordId> {
        self.parse()
    }
}

impl IntoRecordId for String {
    fn into_record_id(self) -> DbResult<RecordId> {
        self.parse()
    }
}

impl IntoRecordId for &String {
    fn into_record_id(self) -> DbResult<RecordId> {
        self.parse()
    }
}

impl IntoRecordId for u64 {
    fn into_record_id(self) -> DbResult<RecordId> {
        RecordId::try_from(self)
    }
}
