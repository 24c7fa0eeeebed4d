//! Backend implementations.
//!
//! Each backend implements [`BackendHandle`](crate::core::BackendHandle) for
//! one filesystem and [`BackendConnector`](crate::core::BackendConnector) to
//! open all of them.
//!
//! Available backends:
//! - `sqlite` (default) - one SQLite database file per filesystem

#[cfg(feature = "sqlite")]
pub mod sqlite;
