//! Scriptable in-memory backends.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use lmt_persistence::config::ReconnectConfig;
use lmt_persistence::connection::ManualClock;
use lmt_persistence::core::{
    BackendConnector, BackendHandle, DeviceSample, EntityKind, MetadataSample, OperationSample,
    RouterSample, ServerSample,
};
use lmt_persistence::{BackendError, Ingestor};

/// One insert seen by a fake backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Inserted {
    /// Backend that accepted the insert.
    pub backend: String,
    /// Kind of the inserted entity.
    pub kind: EntityKind,
    /// Entity name (operation name for operations).
    pub name: String,
    /// Metadata device of an operation.
    pub parent: Option<String>,
    /// Numeric payload in column order.
    pub values: Vec<u64>,
}

/// Shared record of every insert across reconnects.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Inserted>>>);

impl Journal {
    fn push(&self, entry: Inserted) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<Inserted> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn for_backend(&self, backend: &str) -> Vec<Inserted> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.backend == backend)
            .collect()
    }

    pub fn of_kind(&self, kind: EntityKind) -> Vec<Inserted> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Topology and failure script for one fake backend.
#[derive(Debug, Clone)]
pub struct FakeSpec {
    pub name: String,
    pub known: HashMap<EntityKind, HashSet<String>>,
    pub failing_insert: Option<EntityKind>,
    pub failing_lookup: bool,
}

impl FakeSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            known: HashMap::new(),
            failing_insert: None,
            failing_lookup: false,
        }
    }

    pub fn knows(mut self, kind: EntityKind, names: &[&str]) -> Self {
        self.known
            .entry(kind)
            .or_default()
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn failing_insert(mut self, kind: EntityKind) -> Self {
        self.failing_insert = Some(kind);
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.failing_lookup = true;
        self
    }
}

/// A handle produced by [`FakeConnector`].
#[derive(Debug)]
pub struct FakeBackend {
    spec: FakeSpec,
    journal: Journal,
    open_handles: Arc<AtomicUsize>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeBackend {
    fn record(
        &self,
        kind: EntityKind,
        name: &str,
        parent: Option<&str>,
        values: Vec<u64>,
    ) -> Result<(), BackendError> {
        if self.spec.failing_insert == Some(kind) {
            return Err(BackendError::Internal {
                backend_name: self.spec.name.clone(),
                message: "disk I/O error".to_string(),
                source: None,
            });
        }
        self.journal.push(Inserted {
            backend: self.spec.name.clone(),
            kind,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            values,
        });
        Ok(())
    }
}

impl BackendHandle for FakeBackend {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn lookup(&self, kind: EntityKind, name: &str) -> Result<bool, BackendError> {
        if self.spec.failing_lookup {
            return Err(BackendError::Internal {
                backend_name: self.spec.name.clone(),
                message: "database is locked".to_string(),
                source: None,
            });
        }
        Ok(self
            .spec
            .known
            .get(&kind)
            .is_some_and(|names| names.contains(name)))
    }

    fn insert_server(&self, sample: &ServerSample<'_>) -> Result<(), BackendError> {
        self.record(EntityKind::Server, sample.name, None, Vec::new())
    }

    fn insert_device(&self, sample: &DeviceSample<'_>) -> Result<(), BackendError> {
        self.record(
            EntityKind::Device,
            sample.name,
            None,
            vec![
                sample.read_bytes,
                sample.write_bytes,
                sample.kbytes.used,
                sample.kbytes.free,
                sample.inodes.used,
                sample.inodes.free,
            ],
        )
    }

    fn insert_metadata_server(&self, sample: &MetadataSample<'_>) -> Result<(), BackendError> {
        self.record(
            EntityKind::MetadataDevice,
            sample.name,
            None,
            vec![
                sample.kbytes.used,
                sample.kbytes.free,
                sample.inodes.used,
                sample.inodes.free,
            ],
        )
    }

    fn insert_operation(&self, sample: &OperationSample<'_>) -> Result<(), BackendError> {
        self.record(
            EntityKind::Operation,
            sample.operation,
            Some(sample.device),
            vec![sample.samples, sample.sum, sample.sum_squares],
        )
    }

    fn insert_router(&self, sample: &RouterSample<'_>) -> Result<(), BackendError> {
        self.record(EntityKind::Router, sample.name, None, vec![sample.bytes])
    }
}

/// Connector over scripted fake backends.
///
/// Clones share all state, so a test keeps one clone to inspect and script
/// while the ingestor owns another.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    specs: Arc<Mutex<Vec<FakeSpec>>>,
    journal: Journal,
    connects: Arc<AtomicUsize>,
    open_handles: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
}

impl FakeConnector {
    pub fn new(specs: Vec<FakeSpec>) -> Self {
        Self {
            specs: Arc::new(Mutex::new(specs)),
            journal: Journal::default(),
            connects: Arc::new(AtomicUsize::new(0)),
            open_handles: Arc::new(AtomicUsize::new(0)),
            refuse: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of connect-all calls so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of handles that have not been dropped.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Makes every following connect-all fail (or succeed again).
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Replaces the topology used by following connect-all calls.
    pub fn set_specs(&self, specs: Vec<FakeSpec>) {
        *self.specs.lock() = specs;
    }
}

impl BackendConnector for FakeConnector {
    fn connect_all(&self) -> Result<Vec<Box<dyn BackendHandle>>, BackendError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(BackendError::ConnectionFailed {
                backend_name: "fake".to_string(),
                message: "connection refused".to_string(),
            });
        }

        let specs = self.specs.lock().clone();
        let mut handles: Vec<Box<dyn BackendHandle>> = Vec::with_capacity(specs.len());
        for spec in specs {
            self.open_handles.fetch_add(1, Ordering::SeqCst);
            handles.push(Box::new(FakeBackend {
                spec,
                journal: self.journal.clone(),
                open_handles: Arc::clone(&self.open_handles),
            }));
        }
        Ok(handles)
    }
}

/// Builds an ingestor over `connector` with the default 15 s reconnect
/// interval and a manual clock.
pub fn create_ingestor(connector: &FakeConnector, clock: &ManualClock) -> Ingestor {
    Ingestor::with_clock(
        connector.clone(),
        ReconnectConfig::default(),
        Arc::new(clock.clone()),
    )
}
