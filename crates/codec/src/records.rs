//! Typed telemetry records.
//!
//! Every record here is the decoded form of one wire string (or one nested
//! part of it). Records carry the raw counters exactly as the agent reported
//! them; conversions such as free/total to used/free happen at insertion time.

use serde::{Deserialize, Serialize};

/// A storage server (OSS) snapshot with its attached devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Server host name.
    pub name: String,
    /// CPU utilization in percent.
    pub pct_cpu: f32,
    /// Memory utilization in percent.
    pub pct_mem: f32,
    /// Devices reported by this server, in wire order.
    pub devices: Vec<DeviceRecord>,
}

/// A storage device (OST) snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device name, e.g. `lustre-OST0000`.
    pub name: String,
    /// Name of the server that reported the device, when the wire format
    /// carries it.
    pub server: Option<String>,
    /// Cumulative bytes read.
    pub read_bytes: u64,
    /// Cumulative bytes written.
    pub write_bytes: u64,
    /// Capacity counters in KiB.
    pub kbytes: Capacity,
    /// Inode counters.
    pub inodes: Capacity,
}

/// A metadata server (MDS) snapshot with its metadata devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataServerRecord {
    /// Server host name.
    pub name: String,
    /// CPU utilization in percent.
    pub pct_cpu: f32,
    /// Memory utilization in percent.
    pub pct_mem: f32,
    /// Metadata devices served, in wire order.
    pub devices: Vec<MetadataDeviceRecord>,
}

/// A metadata device (MDT) snapshot with its operation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDeviceRecord {
    /// Device name, e.g. `lustre-MDT0000`.
    pub name: String,
    /// Capacity counters in KiB.
    pub kbytes: Capacity,
    /// Inode counters.
    pub inodes: Capacity,
    /// Per-operation statistics, in wire order.
    pub operations: Vec<OperationRecord>,
}

/// Streaming statistics for one metadata operation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation name, e.g. `open` or `getattr`.
    pub name: String,
    /// Number of samples.
    pub samples: u64,
    /// Sum of sampled values.
    pub sum: u64,
    /// Sum of squares of sampled values.
    pub sum_squares: u64,
}

/// An LNET router snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterRecord {
    /// Router host name.
    pub name: String,
    /// CPU utilization in percent.
    pub pct_cpu: f32,
    /// Memory utilization in percent.
    pub pct_mem: f32,
    /// Cumulative bytes routed.
    pub bytes: u64,
}

/// The legacy combined metadata record (`mds_v2`).
///
/// Older agents folded the server and its single metadata device into one
/// flat string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMetadataRecord {
    /// Metadata server host name.
    pub server: String,
    /// CPU utilization in percent.
    pub pct_cpu: f32,
    /// Memory utilization in percent.
    pub pct_mem: f32,
    /// The one metadata device carried by the record.
    pub device: MetadataDeviceRecord,
}

/// Server-only snapshot from the legacy `oss_v1` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerLoadRecord {
    /// Server host name.
    pub name: String,
    /// CPU utilization in percent.
    pub pct_cpu: f32,
    /// Memory utilization in percent.
    pub pct_mem: f32,
}

/// A free/total counter pair as reported by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capacity {
    /// Free units.
    pub free: u64,
    /// Total units.
    pub total: u64,
}

impl Capacity {
    /// Creates a counter pair from free and total values.
    pub fn new(free: u64, total: u64) -> Self {
        Self { free, total }
    }

    /// Returns the used count (`total - free`).
    ///
    /// Saturates at zero when an agent reports more free than total units,
    /// which happens transiently while a device is being resized.
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}
