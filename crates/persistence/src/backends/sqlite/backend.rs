//! SQLite backend implementation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{
    BackendHandle, DeviceSample, EntityKind, MetadataSample, OperationSample, RouterSample,
    ServerSample,
};
use crate::error::BackendError;

use super::schema;

/// Name to row id, per entity kind.
type Directory = HashMap<EntityKind, HashMap<String, i64>>;

/// SQLite backend for one filesystem's telemetry.
///
/// The entity directories are read once when the backend is opened and then
/// served from memory. Names added by another process become visible after
/// [`reload_directory`](Self::reload_directory) or a reconnect.
pub struct SqliteBackend {
    name: String,
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    is_memory: bool,
    directory: RwLock<Directory>,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .field(
                "directory_len",
                &self.directory.read().values().map(HashMap::len).sum::<usize>(),
            )
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode so readers do not block the ingest writer.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_max_connections() -> u32 {
    4
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteBackendConfig {
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_connections == 0 {
            errors.push("SQLite max connections cannot be 0".to_string());
        }
        if self.min_connections > self.max_connections {
            errors.push("SQLite min connections cannot exceed max connections".to_string());
        }
        if self.connection_timeout_ms == 0 {
            errors.push("SQLite connection timeout cannot be 0".to_string());
        }
        errors
    }
}

impl SqliteBackend {
    /// Creates a new in-memory backend named `name`.
    pub fn in_memory(name: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_config(name, ":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based database.
    pub fn open<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Result<Self, BackendError> {
        Self::with_config(name, path, SqliteBackendConfig::default())
    }

    /// Opens a database with custom configuration, creating the schema if
    /// needed and loading the entity directories.
    pub fn with_config<P: AsRef<Path>>(
        name: impl Into<String>,
        path: P,
        config: SqliteBackendConfig,
    ) -> Result<Self, BackendError> {
        let name = name.into();
        let is_memory = path.as_ref().to_string_lossy() == ":memory:";

        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let foreign_keys = config.enable_foreign_keys;
        let wal = config.enable_wal && !is_memory;
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            if foreign_keys {
                conn.pragma_update(None, "foreign_keys", true)?;
            }
            if wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            Ok(())
        });

        // Every connection to ":memory:" opens its own empty database.
        let max_size = if is_memory { 1 } else { config.max_connections };
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(config.min_connections.min(max_size)))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: name.clone(),
                message: e.to_string(),
            })?;

        let backend = Self {
            name,
            pool,
            config,
            is_memory,
            directory: RwLock::new(Directory::new()),
        };

        backend.init_schema()?;
        backend.reload_directory()?;

        Ok(backend)
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> Result<(), BackendError> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn, &self.name)
    }

    /// Get a connection from the pool.
    pub(crate) fn get_connection(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, BackendError> {
        self.pool.get().map_err(|e| BackendError::ConnectionFailed {
            backend_name: self.name.clone(),
            message: e.to_string(),
        })
    }

    fn internal(&self, what: &str, e: rusqlite::Error) -> BackendError {
        BackendError::Internal {
            backend_name: self.name.clone(),
            message: format!("Failed to {}: {}", what, e),
            source: Some(Box::new(e)),
        }
    }

    /// Re-reads every entity directory from the database.
    ///
    /// Returns the number of names loaded.
    pub fn reload_directory(&self) -> Result<usize, BackendError> {
        let conn = self.get_connection()?;
        let mut directory = Directory::new();

        for kind in EntityKind::ALL {
            let sql = format!("SELECT id, name FROM {}", schema::info_table(kind));
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| self.internal("prepare directory query", e))?;
            let names = stmt
                .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))
                .and_then(|rows| rows.collect::<Result<HashMap<_, _>, _>>())
                .map_err(|e| self.internal(&format!("load {} directory", kind), e))?;
            directory.insert(kind, names);
        }

        let total = directory.values().map(HashMap::len).sum();
        *self.directory.write() = directory;
        debug!(backend = %self.name, entities = total, "Loaded entity directory");
        Ok(total)
    }

    /// Adds `name` to the directory of `kind`, returning its row id.
    ///
    /// Registering a name that already exists returns the existing id.
    pub fn register(&self, kind: EntityKind, name: &str) -> Result<i64, BackendError> {
        let table = schema::info_table(kind);
        let conn = self.get_connection()?;

        conn.execute(
            &format!("INSERT OR IGNORE INTO {} (name) VALUES (?1)", table),
            [name],
        )
        .map_err(|e| self.internal(&format!("register {} {}", kind, name), e))?;
        let id: i64 = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE name = ?1", table),
                [name],
                |row| row.get(0),
            )
            .map_err(|e| self.internal(&format!("read id of {} {}", kind, name), e))?;

        self.directory
            .write()
            .entry(kind)
            .or_default()
            .insert(name.to_string(), id);
        info!(backend = %self.name, kind = %kind, name = %name, id, "Registered entity");
        Ok(id)
    }

    /// Returns the names known for `kind`, sorted.
    pub fn entities(&self, kind: EntityKind) -> Vec<String> {
        let directory = self.directory.read();
        let mut names: Vec<String> = directory
            .get(&kind)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Returns the number of stored samples of `kind`.
    pub fn sample_count(&self, kind: EntityKind) -> Result<u64, BackendError> {
        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", schema::data_table(kind)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| self.internal("count samples", e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn id_of(&self, kind: EntityKind, name: &str) -> Result<i64, BackendError> {
        self.directory
            .read()
            .get(&kind)
            .and_then(|names| names.get(name))
            .copied()
            .ok_or_else(|| BackendError::Internal {
                backend_name: self.name.clone(),
                message: format!("{} {} is not in the directory", kind, name),
                source: None,
            })
    }

    /// Returns true if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

impl BackendHandle for SqliteBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, kind: EntityKind, name: &str) -> Result<bool, BackendError> {
        Ok(self
            .directory
            .read()
            .get(&kind)
            .is_some_and(|names| names.contains_key(name)))
    }

    fn insert_server(&self, sample: &ServerSample<'_>) -> Result<(), BackendError> {
        let id = self.id_of(EntityKind::Server, sample.name)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO server_data (server_id, ts, pct_cpu, pct_mem) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                timestamp(),
                f64::from(sample.pct_cpu),
                f64::from(sample.pct_mem)
            ],
        )
        .map_err(|e| self.internal("insert server sample", e))?;
        Ok(())
    }

    fn insert_device(&self, sample: &DeviceSample<'_>) -> Result<(), BackendError> {
        let id = self.id_of(EntityKind::Device, sample.name)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO device_data (device_id, ts, read_bytes, write_bytes,
                kbytes_used, kbytes_free, inodes_used, inodes_free)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                timestamp(),
                sample.read_bytes,
                sample.write_bytes,
                sample.kbytes.used,
                sample.kbytes.free,
                sample.inodes.used,
                sample.inodes.free
            ],
        )
        .map_err(|e| self.internal("insert device sample", e))?;
        Ok(())
    }

    fn insert_metadata_server(&self, sample: &MetadataSample<'_>) -> Result<(), BackendError> {
        let id = self.id_of(EntityKind::MetadataDevice, sample.name)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO metadata_device_data (metadata_device_id, ts, pct_cpu,
                kbytes_used, kbytes_free, inodes_used, inodes_free)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                timestamp(),
                f64::from(sample.pct_cpu),
                sample.kbytes.used,
                sample.kbytes.free,
                sample.inodes.used,
                sample.inodes.free
            ],
        )
        .map_err(|e| self.internal("insert metadata device sample", e))?;
        Ok(())
    }

    fn insert_operation(&self, sample: &OperationSample<'_>) -> Result<(), BackendError> {
        let device_id = self.id_of(EntityKind::MetadataDevice, sample.device)?;
        let operation_id = self.id_of(EntityKind::Operation, sample.operation)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO operation_data (metadata_device_id, operation_id, ts,
                samples, sum, sum_squares)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                device_id,
                operation_id,
                timestamp(),
                sample.samples,
                sample.sum,
                sample.sum_squares
            ],
        )
        .map_err(|e| self.internal("insert operation sample", e))?;
        Ok(())
    }

    fn insert_router(&self, sample: &RouterSample<'_>) -> Result<(), BackendError> {
        let id = self.id_of(EntityKind::Router, sample.name)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO router_data (router_id, ts, bytes, pct_cpu) VALUES (?1, ?2, ?3, ?4)",
            params![id, timestamp(), sample.bytes, f64::from(sample.pct_cpu)],
        )
        .map_err(|e| self.internal("insert router sample", e))?;
        Ok(())
    }
}
