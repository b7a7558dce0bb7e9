//! Field equality index
//!
//! `field -> value -> ids`. Buckets are sets, so an id appears at most once
//! per value, and iteration is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::document::FieldValue;
use crate::storage::RecordId;

/// Buckets for a single field
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValueBuckets {
    tree: BTreeMap<FieldValue, BTreeSet<RecordId>>,
}

impl ValueBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to the bucket for `value`; a no-op if already present
    pub fn insert(&mut self, value: FieldValue, id: RecordId) {
        self.tree.entry(value).or_default().insert(id);
    }

    /// Ids whose field equals `value`, ascending
    pub fn lookup_eq(&self, value: &FieldValue) -> Vec<RecordId> {
        self.tree
            .get(value)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains_id(&self, id: RecordId) -> bool {
        self.tree.values().any(|ids| ids.contains(&id))
    }
}

/// Equality index over every configured field of one table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldIndex {
    fields: HashMap<String, ValueBuckets>,
}

impl FieldIndex {
    /// Empty index with a bucket map for each field
    pub fn with_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|f| (f.to_string(), ValueBuckets::new()))
                .collect(),
        }
    }

    /// Whether `field` is indexed
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Indexed field names, in no particular order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Add `id` under `(field, value)`. Unindexed fields are ignored.
    pub fn insert(&mut self, field: &str, value: FieldValue, id: RecordId) {
        if let Some(buckets) = self.fields.get_mut(field) {
            buckets.insert(value, id);
        }
    }

    /// Matching ids, or `None` when the field is not indexed
    pub fn lookup(&self, field: &str, value: &FieldValue) -> Option<Vec<RecordId>> {
        self.fields.get(field).map(|b| b.lookup_eq(value))
    }

    /// Whether `id` appears anywhere in the index
    pub fn contains_id(&self, id: RecordId) -> bool {
        self.fields.values().any(|b| b.contains_id(id))
    }
}
