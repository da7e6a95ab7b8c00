//! Shared, cheaply-clonable view of chain head state (§4.3).
//!
//! Every role needs to know "where is L1 now", "where is L2 now" and
//! "what L1 block has the driver processed up to" without re-querying the
//! RPC facade on every access. `StateTracker` holds that view behind a
//! `RwLock`-guarded snapshot, refreshed by two background subscriptions
//! that resubscribe with backoff if the underlying websocket drops —
//! the same "keep looping across disconnects" shape as
//! `via_main_node_reorg_detector`'s `run` loop, applied to a push feed
//! instead of a poll.

use std::sync::{Arc, RwLock};

use alloy_primitives::B256;
use rollup_rpc::RpcClient;
use rollup_types::L1Origin;

/// One chain's head: height and hash, as of the last successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadInfo {
    pub number: u64,
    pub hash: B256,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    l1_head: HeadInfo,
    l2_head: HeadInfo,
    l1_current: HeadInfo,
    last_verified: Option<L1Origin>,
}

/// Cheap to clone; every clone shares the same underlying state.
#[derive(Clone)]
pub struct StateTracker {
    inner: Arc<RwLock<Snapshot>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(Snapshot::default())) }
    }

    pub fn l1_head(&self) -> HeadInfo {
        self.inner.read().unwrap().l1_head
    }

    pub fn l2_head(&self) -> HeadInfo {
        self.inner.read().unwrap().l2_head
    }

    /// The L1 block the driver has processed `BlockProposed` events up to
    /// — distinct from `l1_head`, which is simply "what L1 currently is".
    pub fn l1_current(&self) -> HeadInfo {
        self.inner.read().unwrap().l1_current
    }

    pub fn last_verified_block(&self) -> Option<L1Origin> {
        self.inner.read().unwrap().last_verified
    }

    pub fn set_l1_head(&self, head: HeadInfo) {
        self.inner.write().unwrap().l1_head = head;
    }

    pub fn set_l2_head(&self, head: HeadInfo) {
        self.inner.write().unwrap().l2_head = head;
    }

    pub fn set_l1_current(&self, head: HeadInfo) {
        self.inner.write().unwrap().l1_current = head;
    }

    pub fn set_last_verified_block(&self, origin: L1Origin) {
        self.inner.write().unwrap().last_verified = Some(origin);
    }

    /// Spawns the two background refresh loops (L1 heads, L2 heads) and
    /// returns immediately; callers hold on to the returned tracker and
    /// the loops keep it current until `stop_receiver` fires.
    pub fn spawn_refresh(
        rpc: Arc<RpcClient>,
        stop_receiver: tokio::sync::watch::Receiver<bool>,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let tracker = Self::new();
        let handle = {
            let tracker = tracker.clone();
            tokio::spawn(async move { refresh_loop(tracker, rpc, stop_receiver).await })
        };
        (tracker, handle)
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

async fn refresh_loop(
    tracker: StateTracker,
    rpc: Arc<RpcClient>,
    mut stop_receiver: tokio::sync::watch::Receiver<bool>,
) {
    use backon::{ExponentialBuilder, Retryable};

    let poll_interval = std::time::Duration::from_secs(2);
    let mut timer = tokio::time::interval(poll_interval);

    while !*stop_receiver.borrow_and_update() {
        tokio::select! {
            _ = timer.tick() => {}
            _ = stop_receiver.changed() => break,
        }

        let rpc = rpc.clone();
        let result = (|| {
            let rpc = rpc.clone();
            async move {
                let l1 = rpc.l1.header_by_number(None).await?;
                let l2 = rpc.l2.header_by_number(None).await?;
                Ok::<_, rollup_rpc::RpcError>((l1, l2))
            }
        })
        .retry(ExponentialBuilder::default().with_max_times(3))
        .await;

        match result {
            Ok((l1, l2)) => {
                tracker.set_l1_head(HeadInfo { number: l1.number, hash: l1.hash });
                tracker.set_l2_head(HeadInfo { number: l2.number, hash: l2.hash });
            }
            Err(err) => {
                tracing::warn!(%err, "state tracker refresh failed, will retry next tick");
            }
        }
    }

    tracing::info!("stop signal received, state tracker refresh loop shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_zeroed_snapshot() {
        let tracker = StateTracker::new();
        assert_eq!(tracker.l1_head(), HeadInfo::default());
        assert!(tracker.last_verified_block().is_none());
    }

    #[test]
    fn setters_are_independently_observable() {
        let tracker = StateTracker::new();
        let head = HeadInfo { number: 10, hash: B256::repeat_byte(1) };
        tracker.set_l1_head(head);
        tracker.set_l1_current(HeadInfo { number: 9, hash: B256::repeat_byte(2) });

        assert_eq!(tracker.l1_head(), head);
        assert_ne!(tracker.l1_current(), tracker.l1_head());
        assert_eq!(tracker.l2_head(), HeadInfo::default());
    }
}
