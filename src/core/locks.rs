use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are dropped once the registry grows past this many groups.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per group id, so a group's read-modify-write cycle runs alone.
///
/// Groups are independent: holding the lock for one never blocks another.
#[derive(Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        GroupLocks::default()
    }

    pub async fn acquire(&self, group_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, l| Arc::strong_count(l) > 1);
            }
            locks.entry(group_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
