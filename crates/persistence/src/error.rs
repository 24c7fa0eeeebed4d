//! Error types for the ingestion layer.
//!
//! Every failure of a record is one of three kinds: the wire string could not
//! be decoded, the decoded entities do not map onto the backend topology, or a
//! backend failed while talking to it. Only the last one invalidates the live
//! backend set.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use lmt_codec::DecodeError;

use crate::core::EntityKind;
use crate::report::ErrorClass;

/// The primary error type for all ingestion operations.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The wire string was malformed or of an unsupported version.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The record's entities do not map onto the backend set as required.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A backend failed while connecting, looking up or inserting.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl IngestError {
    /// Returns the reporting class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            IngestError::Decode(_) => ErrorClass::Decode,
            IngestError::Topology(_) => ErrorClass::Topology,
            IngestError::Backend(_) => ErrorClass::BackendIo,
        }
    }

    /// Returns true if the live backend set must be dropped after this error.
    pub fn invalidates_backends(&self) -> bool {
        matches!(self, IngestError::Backend(_))
    }
}

/// Ownership violations detected while routing an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// No backend recognizes the entity.
    #[error("{kind} {name} not found in any backend")]
    NotFound { kind: EntityKind, name: String },

    /// An entity that must have a single owner is known to several backends.
    #[error("{kind} {name} is present in more than one backend ({count} matches)")]
    Ambiguous {
        kind: EntityKind,
        name: String,
        count: usize,
    },

    /// An entity that every backend must know is missing from one of them.
    #[error("{kind} {name} is not present in backend {backend}")]
    MissingFromBackend {
        kind: EntityKind,
        name: String,
        backend: String,
    },
}

impl TopologyError {
    /// Returns the entity kind the violation is about.
    pub fn kind(&self) -> EntityKind {
        match self {
            TopologyError::NotFound { kind, .. }
            | TopologyError::Ambiguous { kind, .. }
            | TopologyError::MissingFromBackend { kind, .. } => *kind,
        }
    }

    /// Returns the entity name the violation is about.
    pub fn name(&self) -> &str {
        match self {
            TopologyError::NotFound { name, .. }
            | TopologyError::Ambiguous { name, .. }
            | TopologyError::MissingFromBackend { name, .. } => name,
        }
    }
}

/// Backend-specific errors.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connecting to a backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connect-all found nothing to connect to.
    #[error("no backends available: {message}")]
    NoBackends { message: String },

    /// Looking up an entity failed.
    #[error("lookup of {kind} {name} failed in {backend_name}: {message}")]
    LookupFailed {
        backend_name: String,
        kind: EntityKind,
        name: String,
        message: String,
    },

    /// Inserting a sample failed.
    #[error("insert of {kind} {name} failed in {backend_name}: {message}")]
    InsertFailed {
        backend_name: String,
        kind: EntityKind,
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connection pool could not hand out a connection.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration failed.
    #[error("schema migration failed for {backend_name}: {message}")]
    MigrationError {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Returns the name of the backend that failed, if there is one.
    pub fn backend_name(&self) -> Option<&str> {
        match self {
            BackendError::NoBackends { .. } => None,
            BackendError::ConnectionFailed { backend_name, .. }
            | BackendError::LookupFailed { backend_name, .. }
            | BackendError::InsertFailed { backend_name, .. }
            | BackendError::PoolExhausted { backend_name }
            | BackendError::MigrationError { backend_name, .. }
            | BackendError::Internal { backend_name, .. } => Some(backend_name),
        }
    }
}

/// Result type alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

// Conversion from rusqlite errors
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for BackendError {
    fn from(err: rusqlite::Error) -> Self {
        BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        IngestError::Backend(BackendError::from(err))
    }
}

// Conversion from r2d2 pool errors
#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for BackendError {
    fn from(_err: r2d2::Error) -> Self {
        BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        }
    }
}
