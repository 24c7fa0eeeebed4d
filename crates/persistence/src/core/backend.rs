//! Backend abstraction for per-filesystem datastores.
//!
//! A [`BackendHandle`] answers two questions about one filesystem: does it
//! know an entity of a given kind and name, and will it accept a sample for
//! that entity. The router never sees row ids or SQL; identity resolution is
//! entirely the handle's business.

use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lmt_codec::Capacity;

use crate::error::BackendError;

/// The name directories a backend resolves entities in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Object or metadata server.
    Server,
    /// Object storage device.
    Device,
    /// Metadata device.
    MetadataDevice,
    /// Metadata operation type.
    Operation,
    /// LNET router.
    Router,
}

impl EntityKind {
    /// Every kind, in directory order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Server,
        EntityKind::Device,
        EntityKind::MetadataDevice,
        EntityKind::Operation,
        EntityKind::Router,
    ];

    /// Returns the lowercase name used in messages and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Server => "server",
            EntityKind::Device => "device",
            EntityKind::MetadataDevice => "metadata-device",
            EntityKind::Operation => "operation",
            EntityKind::Router => "router",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind: {s}"))
    }
}

/// A used/free pair as stored by backends.
///
/// Agents report free and total; backends store used and free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Units in use.
    pub used: u64,
    /// Units available.
    pub free: u64,
}

impl From<Capacity> for Usage {
    fn from(capacity: Capacity) -> Self {
        Usage {
            used: capacity.used(),
            free: capacity.free,
        }
    }
}

/// Load sample for a server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerSample<'a> {
    /// Entity name.
    pub name: &'a str,
    /// CPU usage in percent.
    pub pct_cpu: f32,
    /// Memory usage in percent.
    pub pct_mem: f32,
}

/// Counter sample for an object storage device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSample<'a> {
    /// Entity name.
    pub name: &'a str,
    /// Cumulative bytes read.
    pub read_bytes: u64,
    /// Cumulative bytes written.
    pub write_bytes: u64,
    /// Space in kilobytes.
    pub kbytes: Usage,
    /// Inode counts.
    pub inodes: Usage,
}

/// Sample for a metadata device, carrying its server's cpu load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataSample<'a> {
    /// Entity name.
    pub name: &'a str,
    /// CPU usage in percent.
    pub pct_cpu: f32,
    /// Space in kilobytes.
    pub kbytes: Usage,
    /// Inode counts.
    pub inodes: Usage,
}

/// Counters for one operation type on one metadata device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSample<'a> {
    /// Metadata device the operation ran on.
    pub device: &'a str,
    /// Operation type name.
    pub operation: &'a str,
    /// Number of samples.
    pub samples: u64,
    /// Sum of sample values.
    pub sum: u64,
    /// Sum of squared sample values.
    pub sum_squares: u64,
}

/// Sample for an LNET router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterSample<'a> {
    /// Entity name.
    pub name: &'a str,
    /// Cumulative bytes forwarded.
    pub bytes: u64,
    /// CPU usage in percent.
    pub pct_cpu: f32,
}

/// One live connection to one filesystem's datastore.
///
/// Handles are owned exclusively by a
/// [`BackendSet`](crate::connection::BackendSet). Closing is `Drop`.
pub trait BackendHandle: Send + Sync + Debug {
    /// Returns the backend's name, normally the filesystem name.
    fn name(&self) -> &str;

    /// Returns true if this backend knows an entity of `kind` named `name`.
    fn lookup(&self, kind: EntityKind, name: &str) -> Result<bool, BackendError>;

    /// Stores a server load sample.
    fn insert_server(&self, sample: &ServerSample<'_>) -> Result<(), BackendError>;

    /// Stores a device counter sample.
    fn insert_device(&self, sample: &DeviceSample<'_>) -> Result<(), BackendError>;

    /// Stores a metadata device sample.
    fn insert_metadata_server(&self, sample: &MetadataSample<'_>) -> Result<(), BackendError>;

    /// Stores an operation counter sample.
    fn insert_operation(&self, sample: &OperationSample<'_>) -> Result<(), BackendError>;

    /// Stores a router sample.
    fn insert_router(&self, sample: &RouterSample<'_>) -> Result<(), BackendError>;
}

/// Opens every configured backend at once.
///
/// Either every backend connects or the call fails; a partial list is never
/// returned.
pub trait BackendConnector: Send + Sync + Debug {
    /// Connects to all backends.
    fn connect_all(&self) -> Result<Vec<Box<dyn BackendHandle>>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_names() {
        assert_eq!(EntityKind::MetadataDevice.to_string(), "metadata-device");
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("mdt".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_entity_kind_serde_matches_display() {
        let json = serde_json::to_string(&EntityKind::MetadataDevice).unwrap();
        assert_eq!(json, "\"metadata-device\"");
    }

    #[test]
    fn test_usage_from_capacity() {
        let usage = Usage::from(Capacity::new(30, 100));
        assert_eq!(usage, Usage { used: 70, free: 30 });
    }
}
