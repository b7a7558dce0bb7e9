//! Store configuration
//!
//! The table set and the per-table index configuration are fixed when the
//! store is opened. A configuration can be built in code or loaded from a
//! JSON file:
//!
//! ```json
//! {
//!   "root": "/var/lib/app/data",
//!   "tables": { "posts": ["author", "tags"] },
//!   "record_extension": "json",
//!   "reuse_ids": false,
//!   "log_level": "warn"
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DbResult};
use crate::observability::Severity;

/// Reserved field name holding a record's multi-valued tags
pub const TAGS_FIELD: &str = "tags";

/// Default record file extension
pub const DEFAULT_EXTENSION: &str = "json";

/// Fields to index for one table, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexConfig {
    fields: Vec<String>,
}

impl IndexConfig {
    /// Create from a list of field names
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// All configured fields, `"tags"` included
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Configured equality fields, `"tags"` excluded
    pub fn value_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| *f != TAGS_FIELD)
    }

    /// Whether the reserved tags field is configured
    pub fn indexes_tags(&self) -> bool {
        self.fields.iter().any(|f| f == TAGS_FIELD)
    }

    /// Whether `field` has an equality index
    pub fn indexes_field(&self, field: &str) -> bool {
        field != TAGS_FIELD && self.fields.iter().any(|f| f == field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Configuration for opening a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory; each subdirectory is a table
    pub root: PathBuf,

    /// Index configuration per table. Tables absent here are unindexed.
    #[serde(default)]
    pub tables: BTreeMap<String, IndexConfig>,

    /// Record file extension, without the dot
    #[serde(default = "default_extension")]
    pub record_extension: String,

    /// Derive ids purely from the files present, so deleting the highest
    /// id lets the next create reuse it.
    #[serde(default)]
    pub reuse_ids: bool,

    /// Minimum severity written by the logger.
    ///
    /// The logger is process-wide: opening a store with a level set changes
    /// it for every store in the process. `None` leaves it untouched.
    #[serde(default)]
    pub log_level: Option<Severity>,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl StoreConfig {
    /// Config rooted at `root` with no indexes
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tables: BTreeMap::new(),
            record_extension: default_extension(),
            reuse_ids: false,
            log_level: None,
        }
    }

    /// Add or replace the index configuration of one table
    pub fn with_index<I, S>(mut self, table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(table.into(), IndexConfig::new(fields));
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.record_extension = extension.into();
        self
    }

    pub fn with_reuse_ids(mut self, reuse_ids: bool) -> Self {
        self.reuse_ids = reuse_ids;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Load a JSON configuration file
    pub fn from_file(path: &Path) -> DbResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DbError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: StoreConfig = serde_json::from_str(&content).map_err(|e| {
            DbError::InvalidConfig(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Index configuration of a table, if any
    pub fn index_for(&self, table: &str) -> Option<&IndexConfig> {
        self.tables.get(table)
    }

    /// Validate field names and the extension.
    ///
    /// Does not touch the filesystem; directory checks happen at open.
    pub fn validate(&self) -> DbResult<()> {
        let ext = &self.record_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(DbError::InvalidConfig(format!(
                "record_extension {:?} must be a bare extension",
                ext
            )));
        }

        for (table, index) in &self.tables {
            let mut seen = HashSet::new();
            for field in index.fields() {
                if field.is_empty() {
                    return Err(DbError::InvalidConfig(format!(
                        "table {} has an empty field name",
                        table
                    )));
                }
                if !seen.insert(field.as_str()) {
                    return Err(DbError::InvalidConfig(format!(
                        "table {} indexes {} twice",
                        table, field
                    )));
                }
            }
        }
        Ok(())
    }
}
