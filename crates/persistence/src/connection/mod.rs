//! Backend connection lifecycle.
//!
//! [`ConnectionManager`] owns the [`BackendSet`] and decides when a new
//! connect-all attempt may be made. Time is read through a [`Clock`] so the
//! reconnect gate can be tested without sleeping.

pub mod clock;
pub mod manager;
pub mod set;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{ConnectionManager, ConnectionStatus, Connectivity};
pub use set::BackendSet;
