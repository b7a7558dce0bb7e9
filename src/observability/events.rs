//! Observable events in folio
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Store opened
    DbOpened,
    /// Table discovered at open
    TableDiscovered,
    /// Drain barrier passed
    DbClosed,

    // Writes
    /// Record created
    RecordCreated,
    /// Record overwritten
    RecordUpdated,
    /// Record removed
    RecordDeleted,

    // Index
    /// Table indexes rebuilt
    IndexRebuilt,
    /// Rebuild aborted; table indexes are stale
    IndexRebuildFailed,

    // Queries
    /// Field query answered by scanning
    QueryScanFallback,
    /// Find-first query matched nothing
    QueryEmptyResult,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DbOpened => "DB_OPENED",
            Event::TableDiscovered => "TABLE_DISCOVERED",
            Event::DbClosed => "DB_CLOSED",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::IndexRebuilt => "INDEX_REBUILT",
            Event::IndexRebuildFailed => "INDEX_REBUILD_FAILED",
            Event::QueryScanFallback => "QUERY_SCAN_FALLBACK",
            Event::QueryEmptyResult => "QUERY_EMPTY_RESULT",
        }
    }

    /// Returns whether the event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::IndexRebuildFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
