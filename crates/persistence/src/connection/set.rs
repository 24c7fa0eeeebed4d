//! The live collection of backend handles.

use tracing::info;

use crate::core::BackendHandle;

/// Every connected backend, or nothing.
///
/// A set is filled by one connect-all and emptied as a unit. It is never
/// partially repaired: dropping a handle means dropping all of them.
#[derive(Debug, Default)]
pub struct BackendSet {
    handles: Vec<Box<dyn BackendHandle>>,
}

impl BackendSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_handles(handles: Vec<Box<dyn BackendHandle>>) -> Self {
        Self { handles }
    }

    /// Returns true if no backend is connected.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the number of connected backends.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Iterates over the handles in connect order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn BackendHandle> {
        self.handles.iter().map(|handle| handle.as_ref())
    }

    /// Returns the backend names in connect order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|handle| handle.name()).collect()
    }

    /// Closes every handle and leaves the set empty.
    ///
    /// Returns the number of handles released.
    pub fn invalidate(&mut self) -> usize {
        let released = self.handles.len();
        if released > 0 {
            info!(backends = released, "Invalidating backend set");
        }
        self.handles.clear();
        released
    }
}
