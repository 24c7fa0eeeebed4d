//! SQLite schema definitions and migrations.
//!
//! Each filesystem database has one info table per [`EntityKind`] mapping names
//! to row ids, and one data table per sample type keyed by those ids.

use rusqlite::Connection;

use crate::core::EntityKind;
use crate::error::BackendError;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Returns the info table holding the names of `kind`.
pub fn info_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Server => "server_info",
        EntityKind::Device => "device_info",
        EntityKind::MetadataDevice => "metadata_device_info",
        EntityKind::Operation => "operation_info",
        EntityKind::Router => "router_info",
    }
}

/// Returns the data table for samples of `kind`.
pub fn data_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Server => "server_data",
        EntityKind::Device => "device_data",
        EntityKind::MetadataDevice => "metadata_device_data",
        EntityKind::Operation => "operation_data",
        EntityKind::Router => "router_data",
    }
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection, backend_name: &str) -> Result<(), BackendError> {
    let current_version = get_schema_version(conn, backend_name)?;

    if current_version == 0 {
        create_schema_v1(conn, backend_name)?;
        set_schema_version(conn, backend_name, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(BackendError::MigrationError {
            backend_name: backend_name.to_string(),
            message: format!(
                "database schema version {} is newer than supported version {}",
                current_version, SCHEMA_VERSION
            ),
        });
    }

    Ok(())
}

fn internal(backend_name: &str, what: &str, e: rusqlite::Error) -> BackendError {
    BackendError::Internal {
        backend_name: backend_name.to_string(),
        message: format!("Failed to {}: {}", what, e),
        source: Some(Box::new(e)),
    }
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection, backend_name: &str) -> Result<i32, BackendError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| internal(backend_name, "create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(
    conn: &Connection,
    backend_name: &str,
    version: i32,
) -> Result<(), BackendError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| internal(backend_name, "clear schema_version", e))?;

    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| internal(backend_name, "set schema_version", e))?;

    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection, backend_name: &str) -> Result<(), BackendError> {
    for kind in EntityKind::ALL {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
            info_table(kind)
        );
        conn.execute(&sql, [])
            .map_err(|e| internal(backend_name, &format!("create {}", info_table(kind)), e))?;
    }

    let tables = [
        (
            "server_data",
            "CREATE TABLE IF NOT EXISTS server_data (
                server_id INTEGER NOT NULL REFERENCES server_info(id),
                ts TEXT NOT NULL,
                pct_cpu REAL NOT NULL,
                pct_mem REAL NOT NULL
            )",
        ),
        (
            "device_data",
            "CREATE TABLE IF NOT EXISTS device_data (
                device_id INTEGER NOT NULL REFERENCES device_info(id),
                ts TEXT NOT NULL,
                read_bytes INTEGER NOT NULL,
                write_bytes INTEGER NOT NULL,
                kbytes_used INTEGER NOT NULL,
                kbytes_free INTEGER NOT NULL,
                inodes_used INTEGER NOT NULL,
                inodes_free INTEGER NOT NULL
            )",
        ),
        (
            "metadata_device_data",
            "CREATE TABLE IF NOT EXISTS metadata_device_data (
                metadata_device_id INTEGER NOT NULL REFERENCES metadata_device_info(id),
                ts TEXT NOT NULL,
                pct_cpu REAL NOT NULL,
                kbytes_used INTEGER NOT NULL,
                kbytes_free INTEGER NOT NULL,
                inodes_used INTEGER NOT NULL,
                inodes_free INTEGER NOT NULL
            )",
        ),
        (
            "operation_data",
            "CREATE TABLE IF NOT EXISTS operation_data (
                metadata_device_id INTEGER NOT NULL REFERENCES metadata_device_info(id),
                operation_id INTEGER NOT NULL REFERENCES operation_info(id),
                ts TEXT NOT NULL,
                samples INTEGER NOT NULL,
                sum INTEGER NOT NULL,
                sum_squares INTEGER NOT NULL
            )",
        ),
        (
            "router_data",
            "CREATE TABLE IF NOT EXISTS router_data (
                router_id INTEGER NOT NULL REFERENCES router_info(id),
                ts TEXT NOT NULL,
                bytes INTEGER NOT NULL,
                pct_cpu REAL NOT NULL
            )",
        ),
    ];

    for (table, sql) in &tables {
        conn.execute(sql, [])
            .map_err(|e| internal(backend_name, &format!("create {} table", table), e))?;
    }

    create_indexes(conn, backend_name)?;

    Ok(())
}

/// Create indexes for time-range queries.
fn create_indexes(conn: &Connection, backend_name: &str) -> Result<(), BackendError> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_server_data_ts ON server_data(server_id, ts)",
        "CREATE INDEX IF NOT EXISTS idx_device_data_ts ON device_data(device_id, ts)",
        "CREATE INDEX IF NOT EXISTS idx_metadata_device_data_ts ON metadata_device_data(metadata_device_id, ts)",
        "CREATE INDEX IF NOT EXISTS idx_operation_data_ts ON operation_data(metadata_device_id, operation_id, ts)",
        "CREATE INDEX IF NOT EXISTS idx_router_data_ts ON router_data(router_id, ts)",
    ];

    for index_sql in &indexes {
        conn.execute(index_sql, [])
            .map_err(|e| internal(backend_name, "create index", e))?;
    }

    Ok(())
}
