//! folio - an embeddable, file-backed record store
//!
//! Each table is a directory of individually stored documents keyed by a
//! sequential integer id. Tables may carry in-memory secondary indexes for
//! field equality and for tag membership, rebuilt in full after every
//! mutation under the table's write lock.
//!
//! ```ignore
//! use folio::{Database, StoreConfig};
//! use serde_json::json;
//!
//! let db = Database::open(StoreConfig::new("data").with_index("posts", ["author", "tags"]))?;
//! let id = db.create("posts", &json!({"author": "alice", "tags": ["go", "db"]}))?;
//! assert_eq!(db.find_all_ids_for_field("posts", "author", "alice")?, vec![id]);
//! assert_eq!(db.find_all_ids_for_tags("posts", ["go"])?, vec![id]);
//! db.close();
//! ```

pub mod config;
pub mod db;
pub mod document;
pub mod errors;
pub mod index;
pub mod lock;
pub mod observability;
pub mod storage;

pub use config::{IndexConfig, StoreConfig, TAGS_FIELD};
pub use db::{Database, Record};
pub use document::{Document, FieldValue, JsonCodec, RecordCodec};
pub use errors::{DbError, DbResult};
pub use storage::{IntoRecordId, LocalBackend, RecordId, StorageBackend};
