//! Full-rebuild index engine
//!
//! Indexes are derived state: after every mutation a table's indexes are
//! recomputed from a fresh scan of its records. The field index and the tag
//! index are each built into a fresh structure and swapped in only if their
//! own build succeeds, so a failure leaves the previous (stale) copy in place
//! and marks the table stale until the next successful rebuild.
//!
//! # Missing and mismatched fields
//!
//! A configured field that is absent, or holds an array or object, aborts
//! the field rebuild with `DecodeError`. A `"tags"` attribute that is absent,
//! not an array, or holds a non-string aborts the tag rebuild with
//! `DecodeError`.

use crate::config::IndexConfig;
use crate::document::Document;
use crate::errors::DbResult;
use crate::storage::{RecordId, TableScan};

use super::field::FieldIndex;
use super::tags::TagIndex;

/// Source of a table's records during a rebuild or scan
pub trait RecordScan {
    /// Every record id in the table, unordered
    fn ids(&self) -> DbResult<Vec<RecordId>>;

    /// Decode one record
    fn load(&self, id: RecordId) -> DbResult<Document>;

    /// Load every record
    fn load_all(&self) -> DbResult<Vec<(RecordId, Document)>> {
        self.ids()?
            .into_iter()
            .map(|id| Ok((id, self.load(id)?)))
            .collect()
    }
}

impl RecordScan for TableScan<'_> {
    fn ids(&self) -> DbResult<Vec<RecordId>> {
        TableScan::ids(self)
    }

    fn load(&self, id: RecordId) -> DbResult<Document> {
        TableScan::load(self, id)
    }
}

/// The index pair of one table
#[derive(Debug, Default)]
pub struct TableIndexes {
    fields: Option<FieldIndex>,
    tags: Option<TagIndex>,
    stale: bool,
}

impl TableIndexes {
    /// Empty indexes shaped by `config`; `None` builds nothing
    pub fn new(config: Option<&IndexConfig>) -> Self {
        let Some(config) = config.filter(|c| !c.is_empty()) else {
            return Self::default();
        };
        Self {
            fields: Some(FieldIndex::with_fields(config.value_fields())),
            tags: config.indexes_tags().then(TagIndex::new),
            stale: false,
        }
    }

    pub fn field_index(&self) -> Option<&FieldIndex> {
        self.fields.as_ref()
    }

    pub fn tag_index(&self) -> Option<&TagIndex> {
        self.tags.as_ref()
    }

    /// Whether the last rebuild failed
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether `id` appears in either index
    pub fn contains_id(&self, id: RecordId) -> bool {
        self.fields.as_ref().map_or(false, |f| f.contains_id(id))
            || self.tags.as_ref().map_or(false, |t| t.contains_id(id))
    }
}

/// Rebuilds a table's indexes from its records
pub struct IndexEngine;

impl IndexEngine {
    /// Recompute both indexes of a table.
    ///
    /// Tables without index configuration are left untouched.
    pub fn rebuild<S: RecordScan + ?Sized>(
        indexes: &mut TableIndexes,
        config: Option<&IndexConfig>,
        scan: &S,
    ) -> DbResult<()> {
        let Some(config) = config.filter(|c| !c.is_empty()) else {
            return Ok(());
        };

        indexes.stale = true;
        let records = scan.load_all()?;

        indexes.fields = Some(Self::rebuild_field_index(config, &records)?);
        if config.indexes_tags() {
            indexes.tags = Some(Self::rebuild_tag_index(&records)?);
        }

        indexes.stale = false;
        Ok(())
    }

    /// Build the equality index over every configured field except tags
    pub fn rebuild_field_index(
        config: &IndexConfig,
        records: &[(RecordId, Document)],
    ) -> DbResult<FieldIndex> {
        let mut index = FieldIndex::with_fields(config.value_fields());
        for (id, doc) in records {
            for field in config.value_fields() {
                index.insert(field, doc.field_value(field)?, *id);
            }
        }
        Ok(index)
    }

    /// Build the tag index from every record's tags
    pub fn rebuild_tag_index(records: &[(RecordId, Document)]) -> DbResult<TagIndex> {
        let mut index = TagIndex::new();
        for (id, doc) in records {
            for tag in doc.tags()? {
                index.insert(tag, *id);
            }
        }
        Ok(index)
    }
}
