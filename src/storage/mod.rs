//! Table storage for folio
//!
//! Each table is a directory under the store root and each record a file
//! named by its decimal identifier. Single-file writes are atomic through
//! rename; nothing spans more than one file.

mod backend;
mod id;
mod table;

pub use backend::{LocalBackend, StorageBackend};
pub use id::{IntoRecordId, RecordId};
pub use table::{TableScan, TableStore};
