//! SQLite backend.
//!
//! Each monitored filesystem has its own database file. [`SqliteConnector`]
//! discovers them in a data directory and opens one [`SqliteBackend`] per
//! file.

mod backend;
mod connector;
pub mod schema;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use connector::{SqliteConnector, SqliteConnectorConfig};
