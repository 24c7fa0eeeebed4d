//! Ingestion entry points.
//!
//! An [`Ingestor`] takes one wire string at a time through the same steps:
//! make sure the backend set is connected (or defer), decode, route. A backend
//! failure anywhere drops the whole backend set so the next record reconnects
//! through the throttle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use lmt_codec::{LmtCodec, RecordDecoder, WireKind};

use crate::config::ReconnectConfig;
use crate::connection::{Clock, ConnectionManager, Connectivity};
use crate::core::BackendConnector;
use crate::error::{IngestError, IngestResult};
use crate::report::ErrorReport;
use crate::router::{EntityRouter, PassTally};

/// What an accepted call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestOutcome {
    /// The record was routed and stored.
    Applied(PassTally),
    /// No backend set was available and reconnecting was throttled; the record
    /// was dropped without being decoded.
    Deferred {
        /// Time left until the next connection attempt is admitted.
        retry_in: Duration,
    },
}

impl IngestOutcome {
    /// Returns true if the record was stored.
    pub fn is_applied(&self) -> bool {
        matches!(self, IngestOutcome::Applied(_))
    }

    /// Returns the tally of an applied record.
    pub fn tally(&self) -> Option<PassTally> {
        match self {
            IngestOutcome::Applied(tally) => Some(*tally),
            IngestOutcome::Deferred { .. } => None,
        }
    }
}

/// Decodes wire strings and routes them to their backends.
#[derive(Debug)]
pub struct Ingestor {
    connections: ConnectionManager,
    decoder: Box<dyn RecordDecoder>,
}

impl Ingestor {
    /// Creates an ingestor around a connection manager, using [`LmtCodec`].
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            connections,
            decoder: Box::new(LmtCodec),
        }
    }

    /// Creates an ingestor for `connector` with the system clock.
    pub fn with_connector(
        connector: impl BackendConnector + 'static,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self::new(ConnectionManager::new(connector, reconnect))
    }

    /// Creates an ingestor for `connector` reading time from `clock`.
    pub fn with_clock(
        connector: impl BackendConnector + 'static,
        reconnect: ReconnectConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(ConnectionManager::with_clock(
            Box::new(connector),
            reconnect,
            clock,
        ))
    }

    /// Creates an ingestor for the SQLite databases described by `config`.
    #[cfg(feature = "sqlite")]
    pub fn from_config(config: &crate::config::IngestConfig) -> Result<Self, Vec<String>> {
        config.validate()?;
        let connector = crate::backends::sqlite::SqliteConnector::new(config.sqlite.clone());
        Ok(Self::with_connector(connector, config.reconnect.clone()))
    }

    /// Replaces the decoder.
    pub fn with_decoder(mut self, decoder: impl RecordDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Returns the connection manager.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Ingests a wire string of the given kind.
    ///
    /// Connectivity is checked before decoding, so a throttled call returns
    /// [`IngestOutcome::Deferred`] even for a malformed string.
    pub fn ingest(&mut self, kind: WireKind, wire: &str) -> IngestResult<IngestOutcome> {
        let result = self.process(kind, wire);
        if let Err(err) = &result {
            if err.invalidates_backends() {
                if let IngestError::Backend(backend_err) = err {
                    info!(
                        kind = %kind,
                        failed_backend = backend_err.backend_name().unwrap_or("<none>"),
                        "Backend failure, dropping backend set"
                    );
                }
                self.connections.invalidate();
            }
            ErrorReport::new(kind, err).emit();
        }
        result
    }

    /// Like [`ingest`](Self::ingest), with the failure flattened into an
    /// [`ErrorReport`].
    pub fn ingest_reported(
        &mut self,
        kind: WireKind,
        wire: &str,
    ) -> Result<IngestOutcome, ErrorReport> {
        self.ingest(kind, wire)
            .map_err(|err| ErrorReport::new(kind, &err))
    }

    fn process(&mut self, kind: WireKind, wire: &str) -> IngestResult<IngestOutcome> {
        if let Connectivity::Throttled { retry_in } = self.connections.ensure_connected()? {
            return Ok(IngestOutcome::Deferred { retry_in });
        }

        let record = self.decoder.decode(kind, wire)?;
        let tally = EntityRouter::new(self.connections.backends()).apply(&record)?;
        debug!(
            kind = %kind,
            inserts = tally.inserts,
            skipped = tally.skipped,
            "Ingested record"
        );
        Ok(IngestOutcome::Applied(tally))
    }

    /// Ingests an `ost_v2` storage server string.
    pub fn insert_ost_v2(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::OstV2, s)
    }

    /// Ingests an `mdt_v1` metadata server string.
    pub fn insert_mdt_v1(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::MdtV1, s)
    }

    /// Ingests a `router_v1` string.
    pub fn insert_router_v1(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::RouterV1, s)
    }

    /// Ingests a legacy `mds_v2` string.
    pub fn insert_mds_v2(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::MdsV2, s)
    }

    /// Ingests a legacy `oss_v1` string.
    pub fn insert_oss_v1(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::OssV1, s)
    }

    /// Ingests a legacy `ost_v1` string.
    pub fn insert_ost_v1(&mut self, s: &str) -> IngestResult<IngestOutcome> {
        self.ingest(WireKind::OstV1, s)
    }
}

/// An [`Ingestor`] shared between threads.
///
/// The lock is held for a whole record, so connect, route and invalidate
/// never interleave between callers.
#[derive(Debug, Clone)]
pub struct SharedIngestor {
    inner: Arc<Mutex<Ingestor>>,
}

impl SharedIngestor {
    /// Wraps an ingestor.
    pub fn new(ingestor: Ingestor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ingestor)),
        }
    }

    /// Ingests a wire string of the given kind.
    pub fn ingest(&self, kind: WireKind, wire: &str) -> IngestResult<IngestOutcome> {
        self.inner.lock().ingest(kind, wire)
    }

    /// Returns true if the shared ingestor currently holds a backend set.
    pub fn is_connected(&self) -> bool {
        self.inner.lock().connections().is_connected()
    }
}

impl From<Ingestor> for SharedIngestor {
    fn from(ingestor: Ingestor) -> Self {
        Self::new(ingestor)
    }
}
