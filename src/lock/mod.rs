//! Per-table reader-writer locks
//!
//! One lock per table discovered at open. Each lock owns its table's
//! indexes, so index state is only reachable through a guard:
//!
//! - Readers share the lock for the whole of a query.
//! - A writer holds it exclusively across the file mutation and the index
//!   rebuild, so readers see either the state before a write or after it.
//! - No operation holds two tables' locks at once.
//!
//! Locks are not reentrant. Taking a table's lock while already holding it
//! on the same thread can deadlock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{DbError, DbResult};
use crate::index::TableIndexes;

/// Shared access to a table's indexes
pub type TableReadGuard<'a> = RwLockReadGuard<'a, TableIndexes>;

/// Exclusive access to a table's indexes
pub type TableWriteGuard<'a> = RwLockWriteGuard<'a, TableIndexes>;

/// Lock table, fixed at construction
#[derive(Debug, Default)]
pub struct LockManager {
    tables: HashMap<String, RwLock<TableIndexes>>,
}

impl LockManager {
    /// One lock per table, each owning that table's initial indexes
    pub fn new(tables: impl IntoIterator<Item = (String, TableIndexes)>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(name, indexes)| (name, RwLock::new(indexes)))
                .collect(),
        }
    }

    fn entry(&self, table: &str) -> DbResult<&RwLock<TableIndexes>> {
        self.tables
            .get(table)
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))
    }

    /// Whether `table` has a lock
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Acquire `table` for reading; released when the guard drops.
    ///
    /// A lock poisoned by a panicking holder is recovered. Its indexes may
    /// be stale and are repaired by the next rebuild.
    pub fn read(&self, table: &str) -> DbResult<TableReadGuard<'_>> {
        Ok(self
            .entry(table)?
            .read()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Acquire `table` for writing; released when the guard drops.
    pub fn write(&self, table: &str) -> DbResult<TableWriteGuard<'_>> {
        Ok(self
            .entry(table)?
            .write()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Wait for every in-flight operation to finish.
    ///
    /// Takes and releases each table's write lock in name order. New
    /// operations may start as soon as a table has been passed.
    pub fn drain(&self) {
        for name in self.table_names() {
            if let Ok(guard) = self.write(name) {
                drop(guard);
            }
        }
    }
}
