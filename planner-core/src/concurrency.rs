//! Per-driver serialization for the dynamic-update protocol (spec §5): at
//! most one replan may be in flight for a given driver, and concurrent
//! triggers for the same driver are applied in arrival order. Across
//! drivers there is no ordering requirement, so the lock is keyed by
//! `driver_id`, not global.
//!
//! Grounded on the teacher's `Arc<RwLock<HashMap<...>>>` per-resource
//! registry in `api/src/sync/mod.rs` (`departures: Arc<RwLock<HashMap<String, ...>>>`),
//! generalized from "one entry per GTFS feed" to "one lock per driver".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{PlannerError, PlannerResult};

/// A registry of per-driver mutexes. Cheaply `Clone`-able (an `Arc` around
/// the map); constructed once at process start and shared across every
/// request handler, the same lifetime as `EngineConfig`.
#[derive(Clone, Default)]
pub struct DriverLockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Holds a driver's lock for the lifetime of one replan. Dropping it
/// releases the lock; the next queued waiter (if any) proceeds in arrival
/// order, since `tokio::sync::Mutex` is FIFO.
pub struct DriverLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl DriverLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, driver_id: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.read().await.get(driver_id) {
            return existing.clone();
        }
        let mut locks = self.locks.write().await;
        locks.entry(driver_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Acquires `driver_id`'s lock, waiting up to `deadline`. A wait that
    /// exceeds the deadline fails with `ConcurrencyConflict` rather than
    /// blocking the caller indefinitely.
    pub async fn acquire(&self, driver_id: &str, deadline: Duration) -> PlannerResult<DriverLockGuard> {
        let lock = self.lock_for(driver_id).await;
        match tokio::time::timeout(deadline, lock.lock_owned()).await {
            Ok(guard) => Ok(DriverLockGuard { _guard: guard }),
            Err(_) => Err(PlannerError::concurrency_conflict(driver_id, "replan lock wait exceeded deadline")),
        }
    }
}
