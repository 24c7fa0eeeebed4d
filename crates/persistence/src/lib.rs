//! LMT telemetry persistence
//!
//! This crate takes the telemetry strings published by Lustre Monitoring Tool
//! agents and stores them in per-filesystem databases. A cluster usually
//! monitors several filesystems; each has its own backend, and every server,
//! device and router is owned by the backend(s) of the filesystem it serves.
//!
//! # Features
//!
//! - **Ownership routing**: every entity is looked up in every backend and
//!   written only where it is known, with per-kind cardinality rules
//! - **Cascades**: one server string fans out to its devices, one metadata
//!   server string to its devices and their operation counters
//! - **Reconnect throttling**: a failed backend drops the whole set, and
//!   reconnects are attempted at most once per configured interval
//!
//! # Backend Features
//!
//! - `sqlite` (default) - one SQLite database file per filesystem
//!
//! # Architecture
//!
//! - [`ingest`] - the [`Ingestor`] entry points
//! - [`connection`] - connection manager, backend set and clocks
//! - [`router`] - ownership passes and composite cascades
//! - [`core`] - backend traits and sample types
//! - [`backends`] - backend implementations
//! - [`error`] and [`report`] - error types and user-facing reports
//! - [`config`] - configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use lmt_persistence::Ingestor;
//! use lmt_persistence::config::IngestConfig;
//!
//! let mut config = IngestConfig::default();
//! config.sqlite.data_dir = "/var/lib/lmt".into();
//!
//! let mut ingestor = Ingestor::from_config(&config).expect("valid configuration");
//! let outcome = ingestor.insert_ost_v2("2;oss1;12.5;40.0;scratch-OST0000;100;200;30;100;5;10");
//! match outcome {
//!     Ok(outcome) => println!("{outcome:?}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! # Routing without a database
//!
//! Any [`BackendConnector`](core::BackendConnector) can stand in for the
//! SQLite driver. A record reaching an empty backend set is deferred, not
//! failed, while reconnecting is throttled:
//!
//! ```
//! use lmt_persistence::{BackendError, IngestOutcome, Ingestor};
//! use lmt_persistence::config::ReconnectConfig;
//! use lmt_persistence::core::{BackendConnector, BackendHandle};
//!
//! #[derive(Debug)]
//! struct Offline;
//!
//! impl BackendConnector for Offline {
//!     fn connect_all(&self) -> Result<Vec<Box<dyn BackendHandle>>, BackendError> {
//!         Err(BackendError::NoBackends { message: "offline".into() })
//!     }
//! }
//!
//! let mut ingestor = Ingestor::with_connector(Offline, ReconnectConfig::default());
//! assert!(ingestor.insert_oss_v1("1;oss1;1.0;2.0").is_err());
//! assert!(matches!(
//!     ingestor.insert_oss_v1("1;oss1;1.0;2.0"),
//!     Ok(IngestOutcome::Deferred { .. })
//! ));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod connection;
pub mod core;
pub mod error;
pub mod ingest;
pub mod report;
pub mod router;

// Re-export commonly used types at crate root
pub use error::{BackendError, IngestError, IngestResult, TopologyError};
pub use ingest::{IngestOutcome, Ingestor, SharedIngestor};
pub use report::{ErrorClass, ErrorReport};

pub use connection::{BackendSet, ConnectionManager, Connectivity};
pub use core::{BackendConnector, BackendHandle, EntityKind};
pub use router::{EntityRouter, PassTally};

pub use lmt_codec::{DecodeError, WireKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
