//! Ingestion configuration.
//!
//! All structs deserialize with `serde`, fill missing fields from their
//! defaults, and write durations in humantime form:
//!
//! ```
//! use std::time::Duration;
//! use lmt_persistence::config::IngestConfig;
//!
//! let config: IngestConfig =
//!     serde_json::from_str(r#"{ "reconnect": { "min_interval": "30s" } }"#).unwrap();
//! assert_eq!(config.reconnect.min_interval, Duration::from_secs(30));
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlite")]
use crate::backends::sqlite::SqliteConnectorConfig;

/// Minimum seconds between two connection attempts.
pub const DEFAULT_MIN_RECONNECT_SECS: u64 = 15;

/// Top-level configuration of an [`Ingestor`](crate::Ingestor).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reconnect throttling.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Locator for the bundled SQLite backends.
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub sqlite: SqliteConnectorConfig,
}

impl IngestConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        errors.extend(self.reconnect.problems());

        #[cfg(feature = "sqlite")]
        errors.extend(self.sqlite.problems());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for tests: no reconnect delay.
    pub fn for_testing() -> Self {
        Self {
            reconnect: ReconnectConfig {
                min_interval: Duration::ZERO,
            },
            ..Default::default()
        }
    }
}

/// Throttling of connection attempts while the backend set is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Minimum time between two connect-all attempts.
    #[serde(default = "default_min_interval", with = "humantime_duration")]
    pub min_interval: Duration,
}

fn default_min_interval() -> Duration {
    Duration::from_secs(DEFAULT_MIN_RECONNECT_SECS)
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
        }
    }
}

impl ReconnectConfig {
    /// Creates a configuration with the given interval.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    fn problems(&self) -> Vec<String> {
        // Zero disables throttling.
        if self.min_interval > Duration::from_secs(24 * 60 * 60) {
            vec!["Reconnect interval cannot exceed one day".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Serializes a [`Duration`] as a humantime string such as `"15s"`.
pub(crate) mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
