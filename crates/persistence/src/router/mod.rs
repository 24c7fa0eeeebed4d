//! Entity routing.
//!
//! Every backend owns the entities of one filesystem, so an update must be
//! sent to the backend(s) that know the entity by name. A *pass* routes one
//! entity:
//!
//! 1. look the name up in every backend of the set,
//! 2. check how many backends matched against the rule for that kind,
//! 3. insert the sample into each matching backend.
//!
//! | kind              | owners required              |
//! |-------------------|------------------------------|
//! | server            | one or more                  |
//! | device            | exactly one                  |
//! | metadata-device   | exactly one                  |
//! | operation         | the owner of its device      |
//! | router            | every backend                |
//!
//! Ownership is checked before anything is written, so a topology failure
//! never leaves a partial pass behind. A failed lookup or insert is returned
//! as a [`BackendError`]; dropping the backend set is the caller's job.
//!
//! The composite cascades built from these passes live in [`cascade`].

pub mod cascade;

use std::ops::AddAssign;

use serde::Serialize;
use tracing::debug;

use lmt_codec::{DeviceRecord, MetadataDeviceRecord, OperationRecord, RouterRecord};

use crate::connection::BackendSet;
use crate::core::{
    BackendHandle, DeviceSample, EntityKind, MetadataSample, OperationSample, RouterSample,
    ServerSample, Usage,
};
use crate::error::{BackendError, IngestResult, TopologyError};

pub use cascade::MetadataTarget;

/// Counts of what one or more passes did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassTally {
    /// Samples written, summed over backends.
    pub inserts: usize,
    /// Operations skipped by a backend that knows the device but not the
    /// operation.
    pub skipped: usize,
}

impl PassTally {
    fn inserted(inserts: usize) -> Self {
        Self {
            inserts,
            skipped: 0,
        }
    }
}

impl AddAssign for PassTally {
    fn add_assign(&mut self, other: Self) {
        self.inserts += other.inserts;
        self.skipped += other.skipped;
    }
}

/// How many backends may own an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    AtLeastOne,
    ExactlyOne,
}

/// Routes entity updates across a connected [`BackendSet`].
#[derive(Debug, Clone, Copy)]
pub struct EntityRouter<'a> {
    backends: &'a BackendSet,
}

impl<'a> EntityRouter<'a> {
    /// Creates a router over `backends`.
    pub fn new(backends: &'a BackendSet) -> Self {
        Self { backends }
    }

    /// Server pass: inserted into every backend that knows the server.
    pub fn server_pass(&self, name: &str, pct_cpu: f32, pct_mem: f32) -> IngestResult<PassTally> {
        let sample = ServerSample {
            name,
            pct_cpu,
            pct_mem,
        };
        self.owned_pass(EntityKind::Server, name, Ownership::AtLeastOne, |handle| {
            handle.insert_server(&sample)
        })
    }

    /// Device pass: inserted into the single backend that owns the device.
    pub fn device_pass(&self, device: &DeviceRecord) -> IngestResult<PassTally> {
        let sample = DeviceSample {
            name: &device.name,
            read_bytes: device.read_bytes,
            write_bytes: device.write_bytes,
            kbytes: Usage::from(device.kbytes),
            inodes: Usage::from(device.inodes),
        };
        self.owned_pass(
            EntityKind::Device,
            &device.name,
            Ownership::ExactlyOne,
            |handle| handle.insert_device(&sample),
        )
    }

    /// Metadata device pass: inserted into the single owning backend, with
    /// the cpu load of the server that reported it.
    pub fn metadata_device_pass(
        &self,
        pct_cpu: f32,
        device: &MetadataDeviceRecord,
    ) -> IngestResult<PassTally> {
        let sample = MetadataSample {
            name: &device.name,
            pct_cpu,
            kbytes: Usage::from(device.kbytes),
            inodes: Usage::from(device.inodes),
        };
        self.owned_pass(
            EntityKind::MetadataDevice,
            &device.name,
            Ownership::ExactlyOne,
            |handle| handle.insert_metadata_server(&sample),
        )
    }

    /// Operation pass for one operation on metadata device `device`.
    ///
    /// A backend receives the sample only if it knows both the device and the
    /// operation. One that knows the device but not the operation is counted
    /// as skipped. Fails only if no backend knows the device.
    pub fn operation_pass(&self, device: &str, op: &OperationRecord) -> IngestResult<PassTally> {
        let mut parents = 0;
        let mut targets = Vec::new();
        let mut skipped = 0;

        for handle in self.backends.iter() {
            if !self.lookup(handle, EntityKind::MetadataDevice, device)? {
                continue;
            }
            parents += 1;
            if self.lookup(handle, EntityKind::Operation, &op.name)? {
                targets.push(handle);
            } else {
                skipped += 1;
                debug!(
                    backend = %handle.name(),
                    device = %device,
                    operation = %op.name,
                    "Operation not known to backend, skipping"
                );
            }
        }

        if parents == 0 {
            return Err(TopologyError::NotFound {
                kind: EntityKind::MetadataDevice,
                name: device.to_string(),
            }
            .into());
        }

        let sample = OperationSample {
            device,
            operation: &op.name,
            samples: op.samples,
            sum: op.sum,
            sum_squares: op.sum_squares,
        };
        for handle in &targets {
            Self::insert(*handle, EntityKind::Operation, &op.name, |handle| {
                handle.insert_operation(&sample)
            })?;
        }

        Ok(PassTally {
            inserts: targets.len(),
            skipped,
        })
    }

    /// Router pass: every backend must know the router.
    ///
    /// A router no backend knows is not found; one known to some backends
    /// but not all is reported against the first backend missing it.
    pub fn router_pass(&self, record: &RouterRecord) -> IngestResult<PassTally> {
        let kind = EntityKind::Router;
        let owners = self.owners(kind, &record.name)?;
        if owners.is_empty() {
            return Err(TopologyError::NotFound {
                kind,
                name: record.name.clone(),
            }
            .into());
        }
        if let Some(missing) = self
            .backends
            .iter()
            .find(|handle| !owners.iter().any(|owner| owner.name() == handle.name()))
        {
            return Err(TopologyError::MissingFromBackend {
                kind,
                name: record.name.clone(),
                backend: missing.name().to_string(),
            }
            .into());
        }

        let sample = RouterSample {
            name: &record.name,
            bytes: record.bytes,
            pct_cpu: record.pct_cpu,
        };
        for handle in self.backends.iter() {
            Self::insert(handle, kind, &record.name, |handle| {
                handle.insert_router(&sample)
            })?;
        }
        Ok(PassTally::inserted(self.backends.len()))
    }

    fn owned_pass<F>(
        &self,
        kind: EntityKind,
        name: &str,
        ownership: Ownership,
        insert: F,
    ) -> IngestResult<PassTally>
    where
        F: Fn(&dyn BackendHandle) -> Result<(), BackendError>,
    {
        let owners = self.owners(kind, name)?;
        match owners.len() {
            0 => {
                return Err(TopologyError::NotFound {
                    kind,
                    name: name.to_string(),
                }
                .into());
            }
            count if count > 1 && ownership == Ownership::ExactlyOne => {
                return Err(TopologyError::Ambiguous {
                    kind,
                    name: name.to_string(),
                    count,
                }
                .into());
            }
            _ => {}
        }

        for handle in &owners {
            Self::insert(*handle, kind, name, &insert)?;
        }
        Ok(PassTally::inserted(owners.len()))
    }

    fn owners(&self, kind: EntityKind, name: &str) -> IngestResult<Vec<&'a dyn BackendHandle>> {
        let mut owners = Vec::new();
        for handle in self.backends.iter() {
            if self.lookup(handle, kind, name)? {
                owners.push(handle);
            } else {
                debug!(
                    backend = %handle.name(),
                    kind = %kind,
                    name = %name,
                    "Not owned by backend"
                );
            }
        }
        Ok(owners)
    }

    fn lookup(
        &self,
        handle: &dyn BackendHandle,
        kind: EntityKind,
        name: &str,
    ) -> IngestResult<bool> {
        handle.lookup(kind, name).map_err(|e| {
            BackendError::LookupFailed {
                backend_name: handle.name().to_string(),
                kind,
                name: name.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn insert<F>(
        handle: &dyn BackendHandle,
        kind: EntityKind,
        name: &str,
        insert: F,
    ) -> IngestResult<()>
    where
        F: Fn(&dyn BackendHandle) -> Result<(), BackendError>,
    {
        insert(handle).map_err(|e| BackendError::InsertFailed {
            backend_name: handle.name().to_string(),
            kind,
            name: name.to_string(),
            message: e.to_string(),
            source: Some(Box::new(e)),
        })?;
        debug!(
            backend = %handle.name(),
            kind = %kind,
            name = %name,
            "Inserted sample"
        );
        Ok(())
    }
}
