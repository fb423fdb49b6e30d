//! Single-flight lock for auto-deploy evaluations
//!
//! A `status` success and a `check_run` completion for the same commit often
//! arrive together. Running both scans at once would let each see "not yet
//! deployed" and create two deployments, so evaluations are serialized per
//! repository and ref. The key table lives in process memory only.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::utils::strip_refs_prefix;

/// Purpose tag for auto-deploy evaluations
pub const AUTO_DEPLOY_PURPOSE: &str = "auto-deploy";

/// Lock key derived from a repository id, a ref and a purpose
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(repo_id: u64, git_ref: &str, purpose: &str) -> Self {
        Self(format!("{}:{}:{}", repo_id, strip_refs_prefix(git_ref), purpose))
    }

    pub fn auto_deploy(repo_id: u64, git_ref: &str) -> Self {
        Self::new(repo_id, git_ref, AUTO_DEPLOY_PURPOSE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table entry: the mutex plus the number of callers holding or awaiting it
#[derive(Default)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

type Slots = Mutex<HashMap<LockKey, Slot>>;

/// Keyed lock: calls sharing a key run one at a time, other keys run freely
#[derive(Default)]
pub struct KeyedLock {
    slots: Arc<Slots>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` while holding the lock for `key`.
    ///
    /// The lock is released when the operation finishes, fails, panics or is
    /// cancelled, including cancellation while still waiting for the lock.
    pub async fn lock<F, Fut, T>(&self, key: &LockKey, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(key.clone()).or_default();
            slot.users += 1;
            slot.mutex.clone()
        };
        let mut held = HeldSlot {
            slots: self.slots.clone(),
            key: key.clone(),
            guard: None,
        };

        debug!("Waiting for lock {}", key);
        held.guard = Some(mutex.lock_owned().await);
        debug!("Acquired lock {}", key);

        operation().await
    }

    /// Number of keys currently held or awaited
    pub fn active_keys(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Gives up this caller's claim on the slot and drops the table entry once
/// no holder or waiter is left
struct HeldSlot {
    slots: Arc<Slots>,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldSlot {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = match slots.get_mut(&self.key) {
            Some(slot) => {
                slot.users = slot.users.saturating_sub(1);
                slot.users == 0
            }
            None => false,
        };
        if idle {
            slots.remove(&self.key);
            debug!("Released lock {}", self.key);
        }
    }
}
