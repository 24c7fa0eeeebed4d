//! Rate-limited connection management.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ReconnectConfig;
use crate::core::BackendConnector;
use crate::error::{BackendError, IngestResult};

use super::clock::{Clock, SystemClock};
use super::set::BackendSet;

/// Whether the backend set is usable for the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// The set is connected.
    Ready,
    /// The set is empty and the last attempt was too recent to retry.
    Throttled {
        /// Time left until the next attempt is admitted.
        retry_in: Duration,
    },
}

/// Snapshot of the manager's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Names of the connected backends, empty when disconnected.
    pub backends: Vec<String>,
    /// When the last connect-all attempt was made.
    pub last_attempt: Option<Instant>,
    /// Connect-all attempts that failed since the last success.
    pub consecutive_failures: u32,
    /// Message of the last connect failure.
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    /// Returns true if a backend set is live.
    pub fn is_connected(&self) -> bool {
        !self.backends.is_empty()
    }
}

/// Owns the backend set and gates reconnects by a minimum interval.
///
/// A connect-all is attempted only when the set is empty and either no attempt
/// was ever made or at least `min_interval` has passed since the last one.
#[derive(Debug)]
pub struct ConnectionManager {
    connector: Box<dyn BackendConnector>,
    clock: Arc<dyn Clock>,
    config: ReconnectConfig,
    backends: BackendSet,
    last_attempt: Option<Instant>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

impl ConnectionManager {
    /// Creates a disconnected manager using the system clock.
    pub fn new(connector: impl BackendConnector + 'static, config: ReconnectConfig) -> Self {
        Self::with_clock(Box::new(connector), config, Arc::new(SystemClock))
    }

    /// Creates a disconnected manager reading time from `clock`.
    pub fn with_clock(
        connector: Box<dyn BackendConnector>,
        config: ReconnectConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connector,
            clock,
            config,
            backends: BackendSet::new(),
            last_attempt: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    /// Makes sure a backend set is live, connecting if allowed.
    ///
    /// Returns [`Connectivity::Throttled`] rather than an error when the set
    /// is empty and the previous attempt is too recent. A failed attempt
    /// leaves the set empty and still counts as the last attempt.
    pub fn ensure_connected(&mut self) -> IngestResult<Connectivity> {
        if !self.backends.is_empty() {
            return Ok(Connectivity::Ready);
        }

        let now = self.clock.now();
        if let Some(last) = self.last_attempt {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.config.min_interval {
                let retry_in = self.config.min_interval - elapsed;
                debug!(
                    retry_in = %humantime::format_duration(retry_in),
                    "Reconnect throttled"
                );
                return Ok(Connectivity::Throttled { retry_in });
            }
        }

        self.last_attempt = Some(now);
        match self.connect() {
            Ok(backends) => {
                info!(
                    backends = backends.len(),
                    names = ?backends.names(),
                    "Connected to backends"
                );
                self.backends = backends;
                self.consecutive_failures = 0;
                self.last_error = None;
                Ok(Connectivity::Ready)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_error = Some(e.to_string());
                warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "Failed to connect to backends"
                );
                Err(e.into())
            }
        }
    }

    fn connect(&self) -> Result<BackendSet, BackendError> {
        let handles = self.connector.connect_all()?;
        if handles.is_empty() {
            return Err(BackendError::NoBackends {
                message: "connector returned no backends".to_string(),
            });
        }
        Ok(BackendSet::from_handles(handles))
    }

    /// Returns the live backend set, which may be empty.
    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    /// Returns true if a backend set is live.
    pub fn is_connected(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Drops every backend handle. The next call goes through the reconnect
    /// gate.
    pub fn invalidate(&mut self) -> usize {
        self.backends.invalidate()
    }

    /// Returns a snapshot of the connection state.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            backends: self
                .backends
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            last_attempt: self.last_attempt,
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.clone(),
        }
    }
}
