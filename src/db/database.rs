//! Database handle: the public query and mutation surface.
//!
//! Every operation takes the table's lock first (shared for queries,
//! exclusive for mutations) and releases it only after the store and, for
//! mutations, the index rebuild are done.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::record::Record;
use super::scan::{scan_field_ids, scan_tag_ids};
use crate::config::{IndexConfig, StoreConfig};
use crate::document::{FieldValue, JsonCodec, RecordCodec};
use crate::errors::{DbError, DbResult};
use crate::index::{IndexEngine, TableIndexes};
use crate::lock::LockManager;
use crate::observability::{
    log_event, trace_event, Event, Logger, MetricsRegistry, MetricsSnapshot, ObservationScope,
};
use crate::storage::{IntoRecordId, LocalBackend, RecordId, StorageBackend, TableStore};

/// An open store
#[derive(Debug)]
pub struct Database {
    config: StoreConfig,
    store: TableStore,
    codec: Box<dyn RecordCodec>,
    locks: LockManager,
    metrics: MetricsRegistry,
}

impl Database {
    /// Open the store at `config.root` with the local filesystem and JSON.
    ///
    /// The root and every table named in the index configuration must
    /// already exist.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        if !config.root.is_dir() {
            return Err(DbError::NotFound(config.root.display().to_string()));
        }
        let backend = LocalBackend::new(config.root.clone());
        Self::open_with(config, Box::new(backend), Box::new(JsonCodec))
    }

    /// Open with a caller-supplied substrate and codec
    pub fn open_with(
        config: StoreConfig,
        backend: Box<dyn StorageBackend>,
        codec: Box<dyn RecordCodec>,
    ) -> DbResult<Self> {
        config.validate()?;
        if let Some(level) = config.log_level {
            Logger::set_min_severity(level);
        }

        let root = config.root.display().to_string();
        let scope = ObservationScope::with_fields("DB_OPEN", &[("root", root.as_str())]);

        let store = TableStore::new(backend, config.record_extension.clone(), config.reuse_ids);
        let tables = store.table_names()?;
        for configured in config.tables.keys() {
            if !tables.contains(configured) {
                let reason = format!("table {} has no directory", configured);
                scope.fail(&reason);
                return Err(DbError::NotFound(configured.clone()));
            }
        }

        let mut entries = Vec::with_capacity(tables.len());
        for table in tables {
            let index_config = config.index_for(&table);
            let mut indexes = TableIndexes::new(index_config);
            let scan = store.scan(&table, codec.as_ref());
            if let Err(e) = IndexEngine::rebuild(&mut indexes, index_config, &scan) {
                scope.fail(&e.to_string());
                return Err(e);
            }
            log_event(Event::TableDiscovered, &[("table", table.as_str())]);
            entries.push((table, indexes));
        }

        let table_count = entries.len().to_string();
        let db = Self {
            locks: LockManager::new(entries),
            config,
            store,
            codec,
            metrics: MetricsRegistry::new(),
        };
        scope.complete();
        log_event(Event::DbOpened, &[("root", root.as_str()), ("tables", table_count.as_str())]);
        Ok(db)
    }

    /// Load a record and run its post-load hook under the read lock
    pub fn find<R: Record>(&self, table: &str, id: impl IntoRecordId) -> DbResult<R> {
        let id = id.into_record_id()?;
        let _guard = self.locks.read(table)?;

        let bytes = self.store.find(table, id)?;
        let value = self.codec.decode(&bytes)?;
        let mut record: R = serde_json::from_value(value).map_err(|e| {
            DbError::decode(format!("record {}/{} does not fit the model: {}", table, id, e))
        })?;
        record.after_find(self, id);
        Ok(record)
    }

    /// Every id in the table, ascending
    pub fn find_all_ids(&self, table: &str) -> DbResult<Vec<RecordId>> {
        let _guard = self.locks.read(table)?;
        let mut ids = self.store.list_ids(table)?;
        ids.sort();
        Ok(ids)
    }

    /// Smallest id whose `field` equals `value`; `EmptyResult` if none
    pub fn find_first_id_for_field(
        &self,
        table: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> DbResult<RecordId> {
        let value = value.into();
        let ids = self.find_all_ids_for_field(table, field, value.clone())?;
        match ids.first() {
            Some(id) => Ok(*id),
            None => {
                trace_event(Event::QueryEmptyResult, &[("table", table), ("field", field)]);
                Err(DbError::EmptyResult {
                    table: table.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                })
            }
        }
    }

    /// Ids whose `field` equals `value`, ascending.
    ///
    /// Uses the field index when the table has one for `field`, otherwise
    /// scans every record. Both compare as [`FieldValue`].
    pub fn find_all_ids_for_field(
        &self,
        table: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> DbResult<Vec<RecordId>> {
        let value = value.into();
        let guard = self.locks.read(table)?;

        if let Some(ids) = guard.field_index().and_then(|f| f.lookup(field, &value)) {
            self.metrics.increment_indexed_lookups();
            return Ok(ids);
        }

        self.metrics.increment_scan_lookups();
        trace_event(Event::QueryScanFallback, &[("table", table), ("field", field)]);
        scan_field_ids(&self.store.scan(table, self.codec.as_ref()), field, &value)
    }

    /// Ids whose tags include every requested tag, ascending.
    ///
    /// An empty request returns no ids. Tables without a tag index are
    /// scanned.
    pub fn find_all_ids_for_tags<I, S>(&self, table: &str, tags: I) -> DbResult<Vec<RecordId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: Vec<S> = tags.into_iter().collect();
        let wanted: HashSet<&str> = tags.iter().map(|t| t.as_ref()).collect();
        let guard = self.locks.read(table)?;

        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(index) = guard.tag_index() {
            self.metrics.increment_indexed_lookups();
            return Ok(index.ids_with_all(wanted.iter().copied()));
        }

        self.metrics.increment_scan_lookups();
        trace_event(Event::QueryScanFallback, &[("table", table), ("field", "tags")]);
        scan_tag_ids(&self.store.scan(table, self.codec.as_ref()), &wanted)
    }

    /// Store a new record and return its id.
    ///
    /// Once the record file is written the indexes are always rebuilt, even
    /// if saving the id sequence fails. A failed rebuild leaves the record
    /// written and the table's indexes stale until the next successful
    /// mutation; its error takes precedence over a sequence error.
    pub fn create<T: Serialize + ?Sized>(&self, table: &str, record: &T) -> DbResult<RecordId> {
        let bytes = self.encode(record)?;
        let mut guard = self.locks.write(table)?;

        let id = self.store.allocate_id(table)?;
        self.store.write(table, id, &bytes)?;
        self.metrics.increment_records_created();
        log_event(Event::RecordCreated, &[("table", table), ("id", id.to_string().as_str())]);

        let committed = self.store.commit_id(table, id);
        self.reindex(table, &mut guard)?;
        committed?;
        Ok(id)
    }

    /// Replace the record at `id`, creating the file if it does not exist.
    ///
    /// Error handling after the write follows [`Database::create`].
    pub fn update<T: Serialize + ?Sized>(
        &self,
        table: &str,
        record: &T,
        id: impl IntoRecordId,
    ) -> DbResult<()> {
        let id = id.into_record_id()?;
        let bytes = self.encode(record)?;
        let mut guard = self.locks.write(table)?;

        self.store.write(table, id, &bytes)?;
        self.metrics.increment_records_updated();
        log_event(Event::RecordUpdated, &[("table", table), ("id", id.to_string().as_str())]);

        let committed = self.store.commit_id(table, id);
        self.reindex(table, &mut guard)?;
        committed
    }

    /// Remove the record at `id`; `NotFound` if absent
    pub fn delete(&self, table: &str, id: impl IntoRecordId) -> DbResult<()> {
        let id = id.into_record_id()?;
        let mut guard = self.locks.write(table)?;

        self.store.remove(table, id)?;
        self.metrics.increment_records_deleted();
        log_event(Event::RecordDeleted, &[("table", table), ("id", id.to_string().as_str())]);

        self.reindex(table, &mut guard)
    }

    /// Wait for in-flight operations on every table to finish.
    ///
    /// The handle stays usable afterwards.
    pub fn close(&self) {
        self.locks.drain();
        log_event(Event::DbClosed, &[]);
    }

    /// Tables discovered at open, sorted
    pub fn tables(&self) -> Vec<&str> {
        self.locks.table_names()
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Index configuration of `table`, if it has one
    pub fn index_config(&self, table: &str) -> Option<&IndexConfig> {
        self.config.index_for(table)
    }

    /// Whether the table's last index rebuild failed
    pub fn is_index_stale(&self, table: &str) -> DbResult<bool> {
        Ok(self.locks.read(table)?.is_stale())
    }

    /// Whether `id` is present in any of the table's indexes
    pub fn is_indexed(&self, table: &str, id: impl IntoRecordId) -> DbResult<bool> {
        let id = id.into_record_id()?;
        Ok(self.locks.read(table)?.contains_id(id))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn encode<T: Serialize + ?Sized>(&self, record: &T) -> DbResult<Vec<u8>> {
        let value = serde_json::to_value(record).map_err(|e| DbError::Encode(e.to_string()))?;
        if !value.is_object() {
            return Err(DbError::Encode("record must serialize to an object".to_string()));
        }
        self.codec.encode(&value)
    }

    /// Rebuild `table`'s indexes; the caller holds its write lock
    fn reindex(&self, table: &str, indexes: &mut TableIndexes) -> DbResult<()> {
        let config = self.config.index_for(table);
        if config.map_or(true, IndexConfig::is_empty) {
            return Ok(());
        }

        let scan = self.store.scan(table, self.codec.as_ref());
        match IndexEngine::rebuild(indexes, config, &scan) {
            Ok(()) => {
                self.metrics.increment_index_rebuilds();
                log_event(Event::IndexRebuilt, &[("table", table)]);
                Ok(())
            }
            Err(e) => {
                self.metrics.increment_index_rebuild_failures();
                let reason = e.to_string();
                log_event(
                    Event::IndexRebuildFailed,
                    &[("table", table), ("code", e.code()), ("reason", reason.as_str())],
                );
                Err(e)
            }
        }
    }
}

/// Convenience for callers working with untyped records
impl Database {
    /// Load a record as a generic JSON value
    pub fn find_value(&self, table: &str, id: impl IntoRecordId) -> DbResult<Value> {
        self.find::<Value>(table, id)
    }
}
