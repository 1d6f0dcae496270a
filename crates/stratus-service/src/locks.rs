//! Per-user lock registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use stratus_core::types::UserId;

/// Hands out one mutex per user id, created on first use.
///
/// Upload, deletion, and the quota-admission read inside upload all run
/// under the owning user's lock, so read-decide-write sequences are
/// serialized per user even when requests arrive concurrently.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding the given user's state.
    pub fn for_user(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}
