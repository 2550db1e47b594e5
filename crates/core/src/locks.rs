//! Per-user mutual exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// Lazily created, never-evicted map of per-user mutexes.
///
/// Each service operation acquires the owning user's lock for its entire
/// duration, serializing all of that user's operations across all of their
/// resources while letting different users proceed fully in parallel. Locks
/// live for the process lifetime; at the target scale (personal vaults) the
/// map stays small. A sharded/striped map would bound memory for very large
/// tenant counts at the cost of perfect per-user isolation.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `user_id`, creating it on first touch.
    ///
    /// Callers hold the clone and lock it:
    /// ```ignore
    /// let lock = locks.for_user(user_id);
    /// let _guard = lock.lock();
    /// ```
    pub fn for_user(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_owned())
            .or_default()
            .clone()
    }
}
