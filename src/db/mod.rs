//! Query resolver for folio
//!
//! [`Database`] answers by-id, by-field and by-tags queries and performs
//! create/update/delete, combining the table store, the per-table locks and
//! the index engine.

mod database;
mod record;
mod scan;

pub use database::Database;
pub use record::Record;
