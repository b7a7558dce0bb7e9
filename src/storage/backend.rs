//! Storage substrate
//!
//! Paths handed to a backend are relative to its root.
//!
//! On Unix, files written by the local backend are readable and writable by
//! their owner only (mode 0600).

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{DbError, DbResult};

/// Raw file operations under a root
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Read a whole file
    fn read(&self, path: &Path) -> DbResult<Vec<u8>>;

    /// Replace a file's whole content
    fn write(&self, path: &Path, data: &[u8]) -> DbResult<()>;

    /// Delete a file
    fn delete(&self, path: &Path) -> DbResult<()>;

    /// Names of regular files directly inside `dir`
    fn list_files(&self, dir: &Path) -> DbResult<Vec<String>>;

    /// Names of directories directly inside `dir`
    fn list_dirs(&self, dir: &Path) -> DbResult<Vec<String>>;
}

/// Local filesystem backend
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn list_entries(&self, dir: &Path, want_dirs: bool) -> DbResult<Vec<String>> {
        let full_path = self.full_path(dir);
        let entries =
            fs::read_dir(&full_path).map_err(|e| map_io("list", &full_path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io("list", &full_path, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| map_io("stat", &entry.path(), e))?;
            if file_type.is_dir() != want_dirs {
                continue;
            }
            // Non-UTF-8 names can never be tables or records
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// Create (or truncate) `path` owner-only and write `data` durably
fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn map_io(op: &str, path: &Path, e: io::Error) -> DbError {
    if e.kind() == io::ErrorKind::NotFound {
        DbError::NotFound(path.display().to_string())
    } else {
        DbError::io(format!("Failed to {} {}", op, path.display()), e)
    }
}

impl StorageBackend for LocalBackend {
    fn read(&self, path: &Path) -> DbResult<Vec<u8>> {
        let full_path = self.full_path(path);
        fs::read(&full_path).map_err(|e| map_io("read", &full_path, e))
    }

    /// Writes to a hidden sibling and renames it over the target, so readers
    /// never see a half-written file.
    fn write(&self, path: &Path, data: &[u8]) -> DbResult<()> {
        let full_path = self.full_path(path);
        let file_name = full_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DbError::NotFound(full_path.display().to_string()))?;
        let tmp_path = full_path.with_file_name(format!(".{}.tmp", file_name));

        // A leftover temp file would keep its old mode through truncation
        let _ = fs::remove_file(&tmp_path);
        write_private(&tmp_path, data).map_err(|e| map_io("write", &tmp_path, e))?;
        fs::rename(&tmp_path, &full_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            map_io("rename", &full_path, e)
        })
    }

    fn delete(&self, path: &Path) -> DbResult<()> {
        let full_path = self.full_path(path);
        fs::remove_file(&full_path).map_err(|e| map_io("delete", &full_path, e))
    }

    fn list_files(&self, dir: &Path) -> DbResult<Vec<String>> {
        self.list_entries(dir, false)
    }

    fn list_dirs(&self, dir: &Path) -> DbResult<Vec<String>> {
        self.list_entries(dir, true)
    }
}
