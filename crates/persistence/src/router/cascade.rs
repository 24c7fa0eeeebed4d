//! Composite record handlers.
//!
//! A server update expands into one device pass per device it reports. A
//! metadata server update expands into a metadata device pass per device and
//! an operation pass per operation of that device. The first failing pass
//! stops the cascade.

use lmt_codec::{
    DecodedRecord, DeviceRecord, LegacyMetadataRecord, MetadataDeviceRecord, MetadataServerRecord,
    RouterRecord, ServerLoadRecord, ServerRecord,
};

use crate::error::IngestResult;

use super::{EntityRouter, PassTally};

/// A metadata device together with the cpu load of the server reporting it.
///
/// Both the nested `mdt_v1` layout and the flat `mds_v2` layout reduce to
/// this before routing.
#[derive(Debug, Clone, Copy)]
pub struct MetadataTarget<'r> {
    /// Reporting server's cpu usage in percent.
    pub pct_cpu: f32,
    /// The device and its operations.
    pub device: &'r MetadataDeviceRecord,
}

impl<'r> From<&'r LegacyMetadataRecord> for MetadataTarget<'r> {
    fn from(record: &'r LegacyMetadataRecord) -> Self {
        Self {
            pct_cpu: record.pct_cpu,
            device: &record.device,
        }
    }
}

/// Yields one [`MetadataTarget`] per device of a metadata server record.
pub fn targets(record: &MetadataServerRecord) -> impl Iterator<Item = MetadataTarget<'_>> {
    record.devices.iter().map(move |device| MetadataTarget {
        pct_cpu: record.pct_cpu,
        device,
    })
}

impl EntityRouter<'_> {
    /// Routes any decoded record.
    pub fn apply(&self, record: &DecodedRecord) -> IngestResult<PassTally> {
        match record {
            DecodedRecord::Server(server) => self.apply_server(server),
            DecodedRecord::MetadataServer(server) => self.apply_metadata_server(server),
            DecodedRecord::Router(router) => self.apply_router(router),
            DecodedRecord::LegacyMetadata(legacy) => self.apply_metadata_target(legacy.into()),
            DecodedRecord::ServerLoad(load) => self.apply_server_load(load),
            DecodedRecord::Device(device) => self.apply_device(device),
        }
    }

    /// `ost_v2`: server pass, then a device pass per device.
    ///
    /// Device ownership is looked up independently of which backend matched
    /// the server, so a device that failed over to another server is still
    /// routed to its filesystem.
    pub fn apply_server(&self, record: &ServerRecord) -> IngestResult<PassTally> {
        let mut tally = self.server_pass(&record.name, record.pct_cpu, record.pct_mem)?;
        for device in &record.devices {
            tally += self.device_pass(device)?;
        }
        Ok(tally)
    }

    /// `mdt_v1`: server pass, then the metadata cascade for every device.
    pub fn apply_metadata_server(&self, record: &MetadataServerRecord) -> IngestResult<PassTally> {
        let mut tally = self.server_pass(&record.name, record.pct_cpu, record.pct_mem)?;
        for target in targets(record) {
            tally += self.apply_metadata_target(target)?;
        }
        Ok(tally)
    }

    /// Metadata device pass followed by one operation pass per operation.
    pub fn apply_metadata_target(&self, target: MetadataTarget<'_>) -> IngestResult<PassTally> {
        let device = target.device;
        let mut tally = self.metadata_device_pass(target.pct_cpu, device)?;
        for op in &device.operations {
            tally += self.operation_pass(&device.name, op)?;
        }
        Ok(tally)
    }

    /// `router_v1`.
    pub fn apply_router(&self, record: &RouterRecord) -> IngestResult<PassTally> {
        self.router_pass(record)
    }

    /// `oss_v1`: a server pass with no devices.
    pub fn apply_server_load(&self, record: &ServerLoadRecord) -> IngestResult<PassTally> {
        self.server_pass(&record.name, record.pct_cpu, record.pct_mem)
    }

    /// `ost_v1`: a single device pass.
    pub fn apply_device(&self, record: &DeviceRecord) -> IngestResult<PassTally> {
        self.device_pass(record)
    }
}
