//! Typed records loaded by [`Database::find`](super::Database::find)

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Database;
use crate::storage::RecordId;

/// A caller's model type for one table.
///
/// `after_find` runs right after the record is decoded, while the table's
/// read lock is still held. It may read other tables through `db` but must
/// not touch the table it was loaded from: the lock is not reentrant and a
/// writer queued in between would deadlock both.
pub trait Record: DeserializeOwned {
    fn after_find(&mut self, _db: &Database, _id: RecordId) {}
}

impl Record for Value {}
