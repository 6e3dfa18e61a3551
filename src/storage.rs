//! Storage layer for tk
//!
//! The whole task collection lives in one JSON document (an array of task
//! records). Every operation reads the full document and, if it changed
//! anything, rewrites the full document.
//!
//! # Files
//!
//! ```text
//! tasks.json        # the collection
//! tasks.json.bak    # last unparseable document, overwritten on each recovery
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::task::Task;

/// Default file name for the task document
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

/// Default suffix appended to the document path for corruption backups
pub const DEFAULT_BACKUP_SUFFIX: &str = "bak";

/// Result of reading the task document
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    /// Set when the document could not be parsed and was moved aside
    pub recovered_backup: Option<PathBuf>,
}

/// Storage manager for the task document
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    backup_suffix: String,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Path to the task document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the document is moved to when it cannot be parsed
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    // =========================================================================
    // Task document
    // =========================================================================

    /// Load every task.
    ///
    /// A missing document is an empty collection. A document that does not
    /// parse is moved to [`Storage::backup_path`] and also yields an empty
    /// collection; that case never returns an error.
    pub fn load(&self) -> Result<Loaded> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "task document missing; starting empty");
            return Ok(Loaded::default());
        }

        let content = fs::read(&self.path)?;
        match serde_json::from_slice::<Vec<Task>>(&content) {
            Ok(tasks) => {
                tracing::debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
                Ok(Loaded {
                    tasks,
                    recovered_backup: None,
                })
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "task document is corrupt; starting empty"
                );
                let recovered_backup = self.back_up_corrupt();
                Ok(Loaded {
                    tasks: Vec::new(),
                    recovered_backup,
                })
            }
        }
    }

    /// Replace the document with `tasks` (atomic).
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "saving tasks");
        write_json(&self.path, &tasks)
    }

    fn back_up_corrupt(&self) -> Option<PathBuf> {
        let backup = self.backup_path();
        match fs::rename(&self.path, &backup) {
            Ok(()) => return Some(backup),
            Err(err) => {
                tracing::debug!(error = %err, "rename to backup failed; trying copy");
            }
        }
        match fs::copy(&self.path, &backup) {
            Ok(_) => Some(backup),
            Err(err) => {
                tracing::warn!(
                    backup = %backup.display(),
                    error = %err,
                    "corrupt task document could not be backed up"
                );
                None
            }
        }
    }
}

// =============================================================================
// File I/O helpers (atomic writes for safety)
// =============================================================================

/// Write JSON data atomically (write to temp, then rename)
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(data)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Write data atomically using temp file + rename
///
/// Readers see either the old document or the new one, never a partial write.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    // Temp file must live in the same directory for the rename to be atomic
    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;

    Ok(())
}
