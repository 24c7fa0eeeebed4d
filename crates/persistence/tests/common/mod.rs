//! Test infrastructure for the ingestion layer.
//!
//! This module provides an in-memory backend cluster whose topology and
//! failures are scripted per test, plus wire-string fixtures.

#![allow(dead_code)]

pub mod fake;
pub mod fixtures;

// Re-export commonly used items
pub use fake::*;
pub use fixtures::*;
