//! Named advisory locks on top of the store
//!
//! Mutual exclusion comes from the store's serialized write transactions;
//! this layer adds the wait-with-timeout loop and the holder token that ties
//! a release to the acquisition that owns it.

use std::time::Duration;
use tokio::time::Instant;

use crate::db::{OrderStore, StoreResult};

/// How often a waiter re-checks a held lock
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Proof of a held lock
///
/// Not an RAII guard: release is an explicit store write and stays in the
/// control path that acquired the lock. A lease that is never released falls
/// back to the record's TTL.
#[derive(Debug)]
pub struct LockLease {
    name: String,
    holder: String,
}

impl LockLease {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Advisory lock manager
#[derive(Clone)]
pub struct LockManager {
    store: OrderStore,
}

impl LockManager {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }

    /// Acquire a named lock, waiting up to `wait` for it to become free
    ///
    /// Returns `Ok(None)` when the wait deadline passes without the lock
    /// being acquired - a defined outcome, not an error. The record expires
    /// after `ttl` so a crashed holder cannot block acquirers forever.
    pub async fn acquire(
        &self,
        name: &str,
        wait: Duration,
        ttl: Duration,
    ) -> StoreResult<Option<LockLease>> {
        let holder = uuid::Uuid::new_v4().to_string();
        let ttl_ms = ttl.as_millis() as i64;
        let deadline = Instant::now() + wait;

        loop {
            if self.store.try_acquire_lock(name, &holder, ttl_ms)? {
                return Ok(Some(LockLease {
                    name: name.to_string(),
                    holder,
                }));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Release a held lock
    ///
    /// Returns `false` when the record was no longer ours (TTL expired and
    /// another holder took over); the new owner's lock is left untouched.
    pub fn release(&self, lease: LockLease) -> StoreResult<bool> {
        self.store.release_lock(&lease.name, &lease.holder)
    }
}
