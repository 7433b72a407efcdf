//! In-flight task identity tracking.
//!
//! The only datum in the system touched from multiple threads. Guarded by
//! a single mutex held for the duration of one set read or write, never
//! across a blocking call. An id is present from the moment a task is
//! accepted until its completion is delivered, then removed, so the set
//! only ever holds what is actually in flight.

use std::collections::HashSet;

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RunningTasks {
    tasks: Mutex<HashSet<String>>,
}

impl RunningTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-mark: returns `false` (and changes nothing)
    /// when the id is already in flight.
    pub fn try_begin(&self, id: &str) -> bool {
        self.tasks.lock().insert(id.to_string())
    }

    /// Remove the id. Called on the completion path before the caller is
    /// resumed, so a continuation never sees its own id live.
    pub fn finish(&self, id: &str) {
        self.tasks.lock().remove(id);
    }

    /// Point-in-time snapshot; may be stale immediately after return.
    pub fn is_running(&self, id: &str) -> bool {
        self.tasks.lock().contains(id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}
