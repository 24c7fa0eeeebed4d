//! User-facing error reporting.
//!
//! Every failed ingest call yields exactly one [`ErrorReport`]: the first fatal
//! condition, its class and the wire kind it happened on. Reports are logged
//! once at `warn` when they are created by the ingestor.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use lmt_codec::WireKind;

use crate::error::IngestError;

/// Coarse classification of a failed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    /// The wire string did not parse.
    Decode,
    /// An entity had no owner, several owners, or a missing router.
    Topology,
    /// A backend failed; the backend set was dropped.
    BackendIo,
}

impl ErrorClass {
    /// Returns the lowercase name of the class.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Decode => "decode",
            ErrorClass::Topology => "topology",
            ErrorClass::BackendIo => "backend-io",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error surfaced for one failed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Wire kind of the failed record.
    pub kind: WireKind,
    /// Classification of the failure.
    pub class: ErrorClass,
    /// Human readable description of the first fatal condition.
    pub message: String,
}

impl ErrorReport {
    /// Builds a report for `err` raised while ingesting a `kind` record.
    pub fn new(kind: WireKind, err: &IngestError) -> Self {
        Self {
            kind,
            class: err.class(),
            message: err.to_string(),
        }
    }

    /// Logs the report.
    pub fn emit(&self) {
        warn!(
            kind = %self.kind,
            class = %self.class,
            error = %self.message,
            "Failed to ingest record"
        );
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityKind;
    use crate::error::TopologyError;

    #[test]
    fn test_report_from_topology_error() {
        let err = IngestError::from(TopologyError::NotFound {
            kind: EntityKind::Device,
            name: "fs-OST0003".to_string(),
        });
        let report = ErrorReport::new(WireKind::OstV2, &err);

        assert_eq!(report.class, ErrorClass::Topology);
        assert_eq!(
            report.to_string(),
            "ost_v2: device fs-OST0003 not found in any backend"
        );
    }

    #[test]
    fn test_class_serializes_kebab_case() {
        let json = serde_json::to_string(&ErrorClass::BackendIo).unwrap();
        assert_eq!(json, "\"backend-io\"");
        assert_eq!(ErrorClass::BackendIo.to_string(), "backend-io");
    }
}
