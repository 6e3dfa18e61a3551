//! Configuration loading and management
//!
//! Handles parsing of the `config.toml` file, found in the platform config
//! directory (`~/.config/tk/config.toml` on Linux) unless a path is given.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::SortKey;
use crate::storage::{Storage, DEFAULT_BACKUP_SUFFIX, DEFAULT_TASKS_FILE};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "config.toml";

const APPLICATION: &str = "tk";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Task document settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Listing defaults
    #[serde(default)]
    pub list: ListConfig,
}

/// Task document configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the task document; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Suffix appended to the document path when a corrupt file is set aside
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            backup_suffix: default_backup_suffix(),
        }
    }
}

/// Defaults for `tk list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListConfig {
    /// Sort key: due, created, title, or id
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Sort in descending order
    #[serde(default)]
    pub reverse: bool,
}

fn default_sort() -> String {
    SortKey::default().to_string()
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            sort: default_sort(),
            reverse: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or return defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Location of the config file in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn sort_key(&self) -> Result<SortKey> {
        self.list.sort.parse()
    }

    /// Resolve the task document path.
    ///
    /// An explicit override wins, then `store.path`, then the platform data
    /// directory, then `./tasks.json`.
    pub fn data_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = &self.store.path {
            return path.clone();
        }
        default_data_path()
    }

    pub fn storage(&self, explicit: Option<&Path>) -> Storage {
        Storage::new(self.data_path(explicit)).with_backup_suffix(self.store.backup_suffix.clone())
    }

    fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.list.validate()?;
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        let suffix = self.backup_suffix.trim();
        if suffix.is_empty() {
            return Err(Error::InvalidConfig(
                "store.backup_suffix cannot be empty".to_string(),
            ));
        }
        if suffix.contains('/') || suffix.contains('\\') {
            return Err(Error::InvalidConfig(
                "store.backup_suffix cannot contain path separators".to_string(),
            ));
        }
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("store.path cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

impl ListConfig {
    fn validate(&self) -> Result<()> {
        self.sort
            .parse::<SortKey>()
            .map(|_| ())
            .map_err(|_| {
                Error::InvalidConfig(format!(
                    "list.sort must be one of due, created, title, id (got '{}')",
                    self.sort
                ))
            })
    }
}

/// Default location of the task document
pub fn default_data_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DEFAULT_TASKS_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TASKS_FILE))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}
