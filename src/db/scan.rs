//! Scanning fallbacks for tables or fields without an index.
//!
//! These use the lenient document accessors: a record lacking the field, or
//! holding an array/object there, never matches. For any table whose last
//! rebuild succeeded every record has a scalar value for each indexed field,
//! so the scan and the index agree on every `(field, value)`.

use std::collections::HashSet;

use crate::document::FieldValue;
use crate::errors::DbResult;
use crate::index::RecordScan;
use crate::storage::RecordId;

/// Ids whose `field` equals `value`, ascending
pub(crate) fn scan_field_ids<S: RecordScan + ?Sized>(
    scan: &S,
    field: &str,
    value: &FieldValue,
) -> DbResult<Vec<RecordId>> {
    let mut ids = Vec::new();
    for id in scan.ids()? {
        if scan.load(id)?.matches(field, value) {
            ids.push(id);
        }
    }
    ids.sort();
    Ok(ids)
}

/// Ids whose tags include every tag in `wanted`, ascending
pub(crate) fn scan_tag_ids<S: RecordScan + ?Sized>(
    scan: &S,
    wanted: &HashSet<&str>,
) -> DbResult<Vec<RecordId>> {
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for id in scan.ids()? {
        if scan.load(id)?.has_all_tags(wanted) {
            ids.push(id);
        }
    }
    ids.sort();
    Ok(ids)
}
