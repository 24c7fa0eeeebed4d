//! Wire record kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind and format version of a wire string.
///
/// The names follow the metric names published by the monitoring agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    /// Storage server with nested devices.
    OstV2,
    /// Metadata server with nested metadata devices and operations.
    MdtV1,
    /// LNET router.
    RouterV1,
    /// Legacy flat metadata server + single metadata device.
    MdsV2,
    /// Legacy storage server load only.
    OssV1,
    /// Legacy single storage device.
    OstV1,
}

impl WireKind {
    /// All kinds, in the order the ingest entry points are declared.
    pub const ALL: [WireKind; 6] = [
        WireKind::OstV2,
        WireKind::MdtV1,
        WireKind::RouterV1,
        WireKind::MdsV2,
        WireKind::OssV1,
        WireKind::OstV1,
    ];

    /// Returns the metric name, e.g. `ost_v2`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WireKind::OstV2 => "ost_v2",
            WireKind::MdtV1 => "mdt_v1",
            WireKind::RouterV1 => "router_v1",
            WireKind::MdsV2 => "mds_v2",
            WireKind::OssV1 => "oss_v1",
            WireKind::OstV1 => "ost_v1",
        }
    }

    /// Returns the major version carried in the first field of the string.
    pub fn major_version(&self) -> u32 {
        match self {
            WireKind::OstV2 | WireKind::MdsV2 => 2,
            WireKind::MdtV1 | WireKind::RouterV1 | WireKind::OssV1 | WireKind::OstV1 => 1,
        }
    }

    /// Returns true for formats kept only for older agents.
    pub fn is_legacy(&self) -> bool {
        matches!(self, WireKind::MdsV2 | WireKind::OssV1 | WireKind::OstV1)
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wire kind: {0}")]
pub struct UnknownWireKind(pub String);

impl FromStr for WireKind {
    type Err = UnknownWireKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WireKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownWireKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_kind_display_parse() {
        for kind in WireKind::ALL {
            assert_eq!(kind.to_string().parse::<WireKind>().unwrap(), kind);
        }
        assert!("ost_v3".parse::<WireKind>().is_err());
    }

    #[test]
    fn test_wire_kind_serde_names() {
        let json = serde_json::to_string(&WireKind::RouterV1).unwrap();
        assert_eq!(json, "\"router_v1\"");
    }

    #[test]
    fn test_legacy_kinds() {
        assert!(WireKind::MdsV2.is_legacy());
        assert!(!WireKind::MdtV1.is_legacy());
        assert_eq!(WireKind::MdsV2.major_version(), 2);
    }
}
