//! Discovery of per-filesystem SQLite databases.
//!
//! Every file named `<prefix><fsname>.<extension>` in the data directory is one
//! filesystem backend. Connect-all opens all of them, ordered by filesystem
//! name, and fails as a whole if any of them fails or none exist.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{BackendConnector, BackendHandle};
use crate::error::BackendError;

use super::{SqliteBackend, SqliteBackendConfig};

/// Where the filesystem databases live and how to open them.
///
/// SQLite has no server, so the host, port and credentials a networked
/// backend would need are replaced by a data directory: the directory stands
/// in for the server, and each `<prefix><fsname>.<extension>` file for one
/// filesystem database on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConnectorConfig {
    /// Directory holding one database per filesystem.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name prefix before the filesystem name.
    #[serde(default = "default_database_prefix")]
    pub database_prefix: String,

    /// File extension, without the dot.
    #[serde(default = "default_database_extension")]
    pub database_extension: String,

    /// Settings applied to every opened database.
    #[serde(default)]
    pub backend: SqliteBackendConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/lmt")
}

fn default_database_prefix() -> String {
    "filesystem_".to_string()
}

fn default_database_extension() -> String {
    "db".to_string()
}

impl Default for SqliteConnectorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_prefix: default_database_prefix(),
            database_extension: default_database_extension(),
            backend: SqliteBackendConfig::default(),
        }
    }
}

impl SqliteConnectorConfig {
    /// Creates a configuration for `data_dir` with default naming.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Returns the database path for filesystem `fsname`.
    pub fn database_path(&self, fsname: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{}{}.{}",
            self.database_prefix, fsname, self.database_extension
        ))
    }

    /// Returns the filesystem name encoded in `file_name`, if it is one of
    /// ours.
    pub fn filesystem_name<'f>(&self, file_name: &'f str) -> Option<&'f str> {
        let fsname = file_name
            .strip_prefix(self.database_prefix.as_str())?
            .strip_suffix(self.database_extension.as_str())?
            .strip_suffix('.')?;
        (!fsname.is_empty()).then_some(fsname)
    }

    pub(crate) fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.data_dir.as_os_str().is_empty() {
            errors.push("SQLite data directory cannot be empty".to_string());
        }
        if self.database_extension.is_empty() {
            errors.push("SQLite database extension cannot be empty".to_string());
        }
        errors.extend(self.backend.problems());
        errors
    }
}

/// Connects to every filesystem database in a directory.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    config: SqliteConnectorConfig,
}

impl SqliteConnector {
    /// Creates a connector.
    pub fn new(config: SqliteConnectorConfig) -> Self {
        Self { config }
    }

    /// Lists `(fsname, path)` for every database in the data directory,
    /// ordered by filesystem name.
    pub fn discover(&self) -> Result<Vec<(String, PathBuf)>, BackendError> {
        let dir = &self.config.data_dir;
        let entries = fs::read_dir(dir).map_err(|e| BackendError::ConnectionFailed {
            backend_name: dir.display().to_string(),
            message: format!("cannot read data directory: {}", e),
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackendError::ConnectionFailed {
                backend_name: dir.display().to_string(),
                message: format!("cannot read data directory entry: {}", e),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(fsname) = self.config.filesystem_name(file_name) {
                found.push((fsname.to_string(), path));
            }
        }

        found.sort();
        debug!(dir = %dir.display(), databases = found.len(), "Discovered filesystem databases");
        Ok(found)
    }

    /// Opens the database of one filesystem.
    pub fn open(&self, fsname: &str, path: &Path) -> Result<SqliteBackend, BackendError> {
        SqliteBackend::with_config(fsname, path, self.config.backend.clone())
    }

    /// Creates (or opens) the database for a new filesystem in the data
    /// directory.
    pub fn create_filesystem(&self, fsname: &str) -> Result<SqliteBackend, BackendError> {
        let path = self.config.database_path(fsname);
        info!(filesystem = %fsname, path = %path.display(), "Creating filesystem database");
        self.open(fsname, &path)
    }
}

impl BackendConnector for SqliteConnector {
    fn connect_all(&self) -> Result<Vec<Box<dyn BackendHandle>>, BackendError> {
        let databases = self.discover()?;
        if databases.is_empty() {
            return Err(BackendError::NoBackends {
                message: format!(
                    "no {}*.{} databases in {}",
                    self.config.database_prefix,
                    self.config.database_extension,
                    self.config.data_dir.display()
                ),
            });
        }

        let mut handles: Vec<Box<dyn BackendHandle>> = Vec::with_capacity(databases.len());
        for (fsname, path) in &databases {
            handles.push(Box::new(self.open(fsname, path)?));
        }
        Ok(handles)
    }
}
