//! Table store: one directory per table, one file per record.
//!
//! Layout:
//!
//! ```text
//! <root>/<table>/<id>.<ext>     record content
//! <root>/<table>/.sequence      highest id ever allocated
//! ```
//!
//! The table store performs no locking; callers hold the table's lock.

use std::path::{Path, PathBuf};

use super::backend::StorageBackend;
use super::id::RecordId;
use crate::document::{Document, RecordCodec};
use crate::errors::{DbError, DbResult};

const SEQUENCE_FILE: &str = ".sequence";

/// Raw record IO for every table under one root
#[derive(Debug)]
pub struct TableStore {
    backend: Box<dyn StorageBackend>,
    extension: String,
    reuse_ids: bool,
}

impl TableStore {
    pub fn new(backend: Box<dyn StorageBackend>, extension: impl Into<String>, reuse_ids: bool) -> Self {
        Self {
            backend,
            extension: extension.into(),
            reuse_ids,
        }
    }

    fn record_path(&self, table: &str, id: RecordId) -> PathBuf {
        Path::new(table).join(format!("{}.{}", id, self.extension))
    }

    fn sequence_path(table: &str) -> PathBuf {
        Path::new(table).join(SEQUENCE_FILE)
    }

    /// Names of all table directories under the root
    pub fn table_names(&self) -> DbResult<Vec<String>> {
        self.backend.list_dirs(Path::new(""))
    }

    /// Read a record's stored bytes
    pub fn find(&self, table: &str, id: RecordId) -> DbResult<Vec<u8>> {
        self.backend.read(&self.record_path(table, id))
    }

    /// Identifiers of every record file in the table, unordered.
    ///
    /// Stems must be canonical identifiers. Any other file carrying the
    /// record extension (`draft.json`, `007.json`, `-1.json`) is a
    /// `DecodeError`, and stays one for every scan, rebuild and create on the
    /// table until it is renamed or removed. Hidden files and files with
    /// other extensions are skipped.
    pub fn list_ids(&self, table: &str) -> DbResult<Vec<RecordId>> {
        let suffix = format!(".{}", self.extension);
        let mut ids = Vec::new();
        for name in self.backend.list_files(Path::new(table))? {
            // Hidden files hold bookkeeping and in-flight writes
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(&suffix) else {
                continue;
            };
            let id = stem.parse::<RecordId>().map_err(|_| {
                DbError::decode(format!("record file {}/{} has no numeric id", table, name))
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn read_sequence(&self, table: &str) -> DbResult<Option<RecordId>> {
        let path = Self::sequence_path(table);
        let bytes = match self.backend.read(&path) {
            Ok(bytes) => bytes,
            Err(DbError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let text = String::from_utf8(bytes)
            .map_err(|_| DbError::decode(format!("{} is not UTF-8", path.display())))?;
        text.trim()
            .parse::<RecordId>()
            .map(Some)
            .map_err(|_| DbError::decode(format!("{} holds {:?}", path.display(), text.trim())))
    }

    /// Next identifier for the table.
    ///
    /// `max(existing ids, persisted sequence) + 1`, or 1 for a table that
    /// has never held a record. With `reuse_ids` the sequence is ignored.
    pub fn allocate_id(&self, table: &str) -> DbResult<RecordId> {
        let mut high = self.list_ids(table)?.into_iter().max();
        if !self.reuse_ids {
            high = high.max(self.read_sequence(table)?);
        }
        match high {
            Some(id) => id.next(),
            None => Ok(RecordId::FIRST),
        }
    }

    /// Persist `id` as the table's high-water mark if it is above the
    /// current one.
    pub fn commit_id(&self, table: &str, id: RecordId) -> DbResult<()> {
        if self.reuse_ids {
            return Ok(());
        }
        if self.read_sequence(table)?.map_or(false, |current| current >= id) {
            return Ok(());
        }
        self.backend
            .write(&Self::sequence_path(table), id.to_string().as_bytes())
    }

    /// Replace a record's whole content
    pub fn write(&self, table: &str, id: RecordId, bytes: &[u8]) -> DbResult<()> {
        self.backend.write(&self.record_path(table, id), bytes)
    }

    /// Delete a record; `NotFound` if absent
    pub fn remove(&self, table: &str, id: RecordId) -> DbResult<()> {
        self.backend.delete(&self.record_path(table, id))
    }

    /// Scanner over one table's records, decoding with `codec`
    pub fn scan<'a>(&'a self, table: &'a str, codec: &'a dyn RecordCodec) -> TableScan<'a> {
        TableScan {
            store: self,
            table,
            codec,
        }
    }
}

/// A decoding view over one table
pub struct TableScan<'a> {
    store: &'a TableStore,
    table: &'a str,
    codec: &'a dyn RecordCodec,
}

impl TableScan<'_> {
    pub fn ids(&self) -> DbResult<Vec<RecordId>> {
        self.store.list_ids(self.table)
    }

    pub fn load(&self, id: RecordId) -> DbResult<Document> {
        let bytes = self.store.find(self.table, id)?;
        Document::from_value(self.codec.decode(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonCodec;
    use crate::storage::LocalBackend;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir, reuse_ids: bool) -> TableStore {
        fs::create_dir_all(temp.path().join("posts")).unwrap();
        TableStore::new(Box::new(LocalBackend::new(temp.path())), "json", reuse_ids)
    }

    fn id(v: u64) -> RecordId {
        RecordId::new(v).unwrap()
    }

    #[test]
    fn test_empty_table_allocates_one() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        assert_eq!(store.allocate_id("posts").unwrap(), RecordId::FIRST);
    }

    #[test]
    fn test_allocate_is_max_plus_one() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, true);
        store.write("posts", id(3), b"{}").unwrap();
        store.write("posts", id(10), b"{}").unwrap();
        assert_eq!(store.allocate_id("posts").unwrap(), id(11));
    }

    #[test]
    fn test_sequence_prevents_reuse() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        store.write("posts", id(1), b"{}").unwrap();
        store.write("posts", id(2), b"{}").unwrap();
        store.commit_id("posts", id(2)).unwrap();
        store.remove("posts", id(2)).unwrap();

        assert_eq!(store.allocate_id("posts").unwrap(), id(3));
    }

    #[test]
    fn test_reuse_ids_ignores_sequence() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, true);
        store.write("posts", id(1), b"{}").unwrap();
        store.write("posts", id(2), b"{}").unwrap();
        store.commit_id("posts", id(2)).unwrap();
        store.remove("posts", id(2)).unwrap();

        assert_eq!(store.allocate_id("posts").unwrap(), id(2));
        assert!(!temp.path().join("posts/.sequence").exists());
    }

    #[test]
    fn test_commit_never_lowers_sequence() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        store.commit_id("posts", id(5)).unwrap();
        store.commit_id("posts", id(2)).unwrap();
        assert_eq!(store.allocate_id("posts").unwrap(), id(6));
    }

    #[test]
    fn test_non_numeric_stem_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        fs::write(temp.path().join("posts/notes.json"), b"{}").unwrap();

        assert_eq!(store.allocate_id("posts").unwrap_err().code(), "FOLIO_DECODE_ERROR");
        assert_eq!(store.list_ids("posts").unwrap_err().code(), "FOLIO_DECODE_ERROR");
    }

    #[test]
    fn test_zero_padded_stem_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        store.write("posts", id(7), b"{}").unwrap();
        fs::write(temp.path().join("posts/007.json"), b"{}").unwrap();

        let err = store.list_ids("posts").unwrap_err();
        assert!(err.to_string().contains("007.json"));

        fs::remove_file(temp.path().join("posts/007.json")).unwrap();
        assert_eq!(store.list_ids("posts").unwrap(), vec![id(7)]);
    }

    #[test]
    fn test_list_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        store.write("posts", id(4), b"{}").unwrap();
        store.commit_id("posts", id(4)).unwrap();
        fs::write(temp.path().join("posts/readme.txt"), b"x").unwrap();
        fs::create_dir(temp.path().join("posts/attachments")).unwrap();

        assert_eq!(store.list_ids("posts").unwrap(), vec![id(4)]);
    }

    #[test]
    fn test_find_and_remove_missing() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        assert!(store.find("posts", id(1)).unwrap_err().is_not_found());
        assert!(store.remove("posts", id(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_scan_decodes_documents() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        store.write("posts", id(1), br#"{"author": "alice"}"#).unwrap();

        let codec = JsonCodec;
        let scan = store.scan("posts", &codec);
        assert_eq!(scan.ids().unwrap(), vec![id(1)]);
        let doc = scan.load(id(1)).unwrap();
        assert_eq!(doc.get("author").unwrap(), "alice");
    }
}
