//! LMT telemetry codec
//!
//! Record types and decoders for the delimited text strings published by
//! Lustre Monitoring Tool agents on storage servers, metadata servers and
//! LNET routers.
//!
//! Decoding is exposed through the [`RecordDecoder`] trait so that the
//! persistence layer never depends on one particular grammar. [`LmtCodec`] is
//! the default implementation for the current agent formats.
//!
//! # Example
//!
//! ```
//! use lmt_codec::{LmtCodec, RecordDecoder};
//!
//! let codec = LmtCodec;
//! let server = codec
//!     .decode_ost_v2("2;oss1;12.5;40.0;lustre-OST0000;100;200;30;100;5;10")
//!     .unwrap();
//!
//! assert_eq!(server.devices.len(), 1);
//! assert_eq!(server.devices[0].kbytes.used(), 70);
//! ```

#![warn(missing_docs)]

pub mod error;
mod fields;
pub mod kind;
pub mod metadata;
pub mod records;
pub mod router;
pub mod storage;

use std::fmt::Debug;

pub use error::{DecodeError, DecodeResult};
pub use kind::{UnknownWireKind, WireKind};
pub use records::{
    Capacity, DeviceRecord, LegacyMetadataRecord, MetadataDeviceRecord, MetadataServerRecord,
    OperationRecord, RouterRecord, ServerLoadRecord, ServerRecord,
};

/// A fully decoded wire string of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    /// `ost_v2`
    Server(ServerRecord),
    /// `mdt_v1`
    MetadataServer(MetadataServerRecord),
    /// `router_v1`
    Router(RouterRecord),
    /// `mds_v2`
    LegacyMetadata(LegacyMetadataRecord),
    /// `oss_v1`
    ServerLoad(ServerLoadRecord),
    /// `ost_v1`
    Device(DeviceRecord),
}

/// Decodes wire strings into typed records.
///
/// One method per wire kind. Implementations must not keep state between
/// calls.
pub trait RecordDecoder: Send + Sync + Debug {
    /// Decodes a storage server string with nested devices.
    fn decode_ost_v2(&self, s: &str) -> DecodeResult<ServerRecord>;

    /// Decodes a metadata server string with nested devices and operations.
    fn decode_mdt_v1(&self, s: &str) -> DecodeResult<MetadataServerRecord>;

    /// Decodes a router string.
    fn decode_router_v1(&self, s: &str) -> DecodeResult<RouterRecord>;

    /// Decodes the legacy flat metadata string.
    fn decode_mds_v2(&self, s: &str) -> DecodeResult<LegacyMetadataRecord>;

    /// Decodes the legacy server load string.
    fn decode_oss_v1(&self, s: &str) -> DecodeResult<ServerLoadRecord>;

    /// Decodes the legacy single device string.
    fn decode_ost_v1(&self, s: &str) -> DecodeResult<DeviceRecord>;

    /// Decodes `s` according to `kind`.
    fn decode(&self, kind: WireKind, s: &str) -> DecodeResult<DecodedRecord> {
        Ok(match kind {
            WireKind::OstV2 => DecodedRecord::Server(self.decode_ost_v2(s)?),
            WireKind::MdtV1 => DecodedRecord::MetadataServer(self.decode_mdt_v1(s)?),
            WireKind::RouterV1 => DecodedRecord::Router(self.decode_router_v1(s)?),
            WireKind::MdsV2 => DecodedRecord::LegacyMetadata(self.decode_mds_v2(s)?),
            WireKind::OssV1 => DecodedRecord::ServerLoad(self.decode_oss_v1(s)?),
            WireKind::OstV1 => DecodedRecord::Device(self.decode_ost_v1(s)?),
        })
    }
}

/// The default decoder for the semicolon-delimited agent formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct LmtCodec;

impl RecordDecoder for LmtCodec {
    fn decode_ost_v2(&self, s: &str) -> DecodeResult<ServerRecord> {
        storage::decode_ost_v2(s)
    }

    fn decode_mdt_v1(&self, s: &str) -> DecodeResult<MetadataServerRecord> {
        metadata::decode_mdt_v1(s)
    }

    fn decode_router_v1(&self, s: &str) -> DecodeResult<RouterRecord> {
        router::decode_router_v1(s)
    }

    fn decode_mds_v2(&self, s: &str) -> DecodeResult<LegacyMetadataRecord> {
        metadata::decode_mds_v2(s)
    }

    fn decode_oss_v1(&self, s: &str) -> DecodeResult<ServerLoadRecord> {
        storage::decode_oss_v1(s)
    }

    fn decode_ost_v1(&self, s: &str) -> DecodeResult<DeviceRecord> {
        storage::decode_ost_v1(s)
    }
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
