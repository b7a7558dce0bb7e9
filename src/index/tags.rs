//! Tag index
//!
//! `tag -> ids` over the reserved `"tags"` attribute.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::storage::RecordId;

/// Multi-valued membership index for one table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagIndex {
    tags: BTreeMap<String, BTreeSet<RecordId>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to `tag`'s bucket; a no-op if already present
    pub fn insert(&mut self, tag: impl Into<String>, id: RecordId) {
        self.tags.entry(tag.into()).or_default().insert(id);
    }

    /// Ids carrying `tag`, ascending
    pub fn ids_for(&self, tag: &str) -> Vec<RecordId> {
        self.tags
            .get(tag)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids carrying every requested tag.
    ///
    /// Each id gets one count per distinct requested tag it carries and
    /// qualifies when its count equals the number of distinct requested
    /// tags. An empty request matches nothing.
    pub fn ids_with_all<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<RecordId> {
        let wanted: HashSet<&str> = wanted.into_iter().collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        let mut counts: HashMap<RecordId, usize> = HashMap::new();
        for tag in &wanted {
            if let Some(ids) = self.tags.get(*tag) {
                for id in ids {
                    *counts.entry(*id).or_insert(0) += 1;
                }
            }
        }

        let mut matched: Vec<RecordId> = counts
            .into_iter()
            .filter(|(_, count)| *count == wanted.len())
            .map(|(id, _)| id)
            .collect();
        matched.sort();
        matched
    }

    pub fn contains_id(&self, id: RecordId) -> bool {
        self.tags.values().any(|ids| ids.contains(&id))
    }
}
