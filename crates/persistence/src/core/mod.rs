//! Core backend traits and sample types.
//!
//! - [`BackendHandle`] - one live connection to one filesystem's datastore
//! - [`BackendConnector`] - builds a complete set of handles in one step
//! - [`EntityKind`] - the directories a handle resolves names in
//! - Sample types - the values one insert writes

pub mod backend;

pub use backend::{
    BackendConnector, BackendHandle, DeviceSample, EntityKind, MetadataSample, OperationSample,
    RouterSample, ServerSample, Usage,
};
