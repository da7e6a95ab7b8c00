//! Tracks how many blocks this prover process has committed to proving,
//! so it can refuse new assignments once it is full (§4.7).
//!
//! Two lanes share the same ceiling: `capacity`, block ids this prover is
//! actively proving, and `temp_capacity`, timestamped reservations held
//! between "I just signed an assignment" and "the block actually got
//! proposed and I have a real block id to track" (§C.3). A temp
//! reservation that outlives `temp_capacity_expires` without converting
//! to a real one is assumed abandoned and is dropped on the next access.

use std::collections::HashSet;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct Inner {
    capacity: HashSet<u64>,
    temp_capacity: Vec<Instant>,
}

/// `Clone`-free; share one instance behind an `Arc` the way the caller
/// shares `RpcClient`. Internally lock-guarded so every method takes `&self`.
pub struct CapacityManager {
    max_capacity: u64,
    temp_capacity_expires: Duration,
    inner: RwLock<Inner>,
}

impl CapacityManager {
    pub fn new(max_capacity: u64, temp_capacity_expires: Duration) -> Self {
        Self {
            max_capacity,
            temp_capacity_expires,
            inner: RwLock::new(Inner { capacity: HashSet::new(), temp_capacity: Vec::new() }),
        }
    }

    /// Free slots, not counting temp reservations.
    pub fn read_capacity(&self) -> u64 {
        let inner = self.inner.read().unwrap();
        let free = self.max_capacity - inner.capacity.len() as u64;
        tracing::info!(
            max_capacity = self.max_capacity,
            free_capacity = free,
            used = inner.capacity.len(),
            temp_used = inner.temp_capacity.len(),
            "reading capacity"
        );
        free
    }

    /// Releases the slot held for `block_id`. Returns `false` if this
    /// manager was not tracking that block id — releasing twice, or
    /// releasing a block this process never took, is a caller bug but not
    /// a crash.
    pub fn release(&self, block_id: u64) -> (u64, bool) {
        let mut inner = self.inner.write().unwrap();
        if !inner.capacity.remove(&block_id) {
            tracing::info!(block_id, "cannot release capacity: not held");
            return (self.max_capacity - inner.capacity.len() as u64, false);
        }
        let free = self.max_capacity - inner.capacity.len() as u64;
        tracing::info!(block_id, free_capacity = free, "released capacity");
        (free, true)
    }

    /// Takes a slot for `block_id`. Returns `false` when the manager is
    /// already at `max_capacity`.
    pub fn take(&self, block_id: u64) -> (u64, bool) {
        let mut inner = self.inner.write().unwrap();
        if inner.capacity.len() as u64 == self.max_capacity {
            tracing::info!(block_id, max_capacity = self.max_capacity, "could not take capacity: full");
            return (0, false);
        }
        inner.capacity.insert(block_id);
        let free = self.max_capacity - inner.capacity.len() as u64;
        tracing::info!(block_id, free_capacity = free, "took capacity");
        (free, true)
    }

    /// Takes a temporary reservation ahead of a block id being known, for
    /// the window between signing an assignment and the block actually
    /// being proposed. Counts against the same ceiling as `take`.
    pub fn take_temp(&self) -> (u64, bool) {
        let mut inner = self.inner.write().unwrap();
        clear_expired(&mut inner.temp_capacity, self.temp_capacity_expires);

        if (inner.capacity.len() + inner.temp_capacity.len()) as u64 >= self.max_capacity {
            tracing::info!(max_capacity = self.max_capacity, "could not take temp capacity: full");
            return (0, false);
        }

        inner.temp_capacity.push(Instant::now());
        let free = self.max_capacity - inner.capacity.len() as u64 - inner.temp_capacity.len() as u64;
        (free, true)
    }

    /// Drops any temp reservation older than `temp_capacity_expires`.
    /// Exposed so a caller can force a sweep (e.g. on a timer) without
    /// also taking a new reservation.
    pub fn clear_expired_temp(&self) {
        let mut inner = self.inner.write().unwrap();
        clear_expired(&mut inner.temp_capacity, self.temp_capacity_expires);
    }
}

fn clear_expired(temp_capacity: &mut Vec<Instant>, expires: Duration) {
    let before = temp_capacity.len();
    temp_capacity.retain(|taken_at| taken_at.elapsed() <= expires);
    if temp_capacity.len() != before {
        tracing::info!(cleared = before - temp_capacity.len(), "cleared expired temp capacity reservations");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_and_release_round_trip() {
        let mgr = CapacityManager::new(2, Duration::from_secs(60));
        assert_eq!(mgr.read_capacity(), 2);

        let (free, ok) = mgr.take(1);
        assert!(ok);
        assert_eq!(free, 1);

        let (free, ok) = mgr.release(1);
        assert!(ok);
        assert_eq!(free, 2);
    }

    #[test]
    fn take_fails_once_full() {
        let mgr = CapacityManager::new(1, Duration::from_secs(60));
        assert!(mgr.take(1).1);
        assert!(!mgr.take(2).1);
    }

    #[test]
    fn release_of_untracked_block_fails() {
        let mgr = CapacityManager::new(2, Duration::from_secs(60));
        assert!(!mgr.release(99).1);
    }

    #[test]
    fn temp_capacity_shares_the_same_ceiling() {
        let mgr = CapacityManager::new(2, Duration::from_secs(60));
        assert!(mgr.take(1).1);
        assert!(mgr.take_temp().1);
        assert!(!mgr.take_temp().1);
    }

    #[test]
    fn expired_temp_capacity_is_reclaimed() {
        let mgr = CapacityManager::new(1, Duration::from_millis(0));
        assert!(mgr.take_temp().1);
        std::thread::sleep(Duration::from_millis(5));
        // the expired reservation from above should be cleared before this
        // call counts current usage.
        assert!(mgr.take_temp().1);
    }
}
