//! Secondary indexes for folio
//!
//! Indexes are derived, in-memory-only state rebuilt from a table's records.
//!
//! - Field index: configured field's value -> ids
//! - Tag index: tag -> ids, when `"tags"` is configured
//!
//! Rebuilding is a full rescan behind [`IndexEngine`]; callers only see
//! [`TableIndexes`] and its lookups.

mod engine;
mod field;
mod tags;

pub use engine::{IndexEngine, RecordScan, TableIndexes};
pub use field::{FieldIndex, ValueBuckets};
pub use tags::TagIndex;
