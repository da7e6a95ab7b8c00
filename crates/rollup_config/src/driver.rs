use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the driver / chain syncer (§4.2).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DriverConfig {
    /// Whether to attempt P2P beacon sync toward the latest verified block
    /// before falling back to calldata/blob derivation.
    pub p2p_sync_verified_blocks: bool,
    /// How long beacon sync may run before the driver gives up and falls
    /// back to derivation. Value in milliseconds.
    pub p2p_sync_timeout_ms: u64,
    /// Upper bound on L1 blocks scanned per `process_l1_blocks` invocation,
    /// mirroring the Go client's `MaxL1BlocksRead` (SPEC_FULL.md §C.1).
    pub max_l1_blocks_per_iteration: u64,
    /// Deadline for `wait_l1_origin`, in milliseconds; default matches the
    /// spec's 3 minutes.
    pub wait_l1_origin_timeout_ms: u64,
    /// How often the driver polls for new L1 blocks between subscription
    /// events, in milliseconds.
    pub poll_interval_ms: u64,
    /// Hex-encoded secp256k1 private key for the golden-touch account, the
    /// fixed L2 signer authorized to submit anchor transactions. In a real
    /// deployment this is the protocol-wide constant published alongside
    /// the L2 contracts; kept configurable here rather than hardcoded so
    /// per-network deployments (including test networks with a distinct
    /// golden-touch key) don't require a code change.
    pub golden_touch_private_key: String,
    /// Anchor transaction gas limit, a protocol constant
    /// (`ANCHOR_GAS_LIMIT` in the L2 contract).
    pub anchor_gas_limit: u64,
    /// Unix timestamp of beacon chain slot 0, used to convert an L1
    /// execution block's timestamp into the beacon slot its blob sidecars
    /// are indexed under.
    pub beacon_genesis_time: u64,
    /// Beacon chain seconds-per-slot.
    pub beacon_seconds_per_slot: u64,
}

impl DriverConfig {
    pub fn p2p_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.p2p_sync_timeout_ms)
    }

    pub fn wait_l1_origin_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_l1_origin_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn for_tests() -> Self {
        Self {
            p2p_sync_verified_blocks: false,
            p2p_sync_timeout_ms: 30_000,
            max_l1_blocks_per_iteration: 1_000,
            wait_l1_origin_timeout_ms: 180_000,
            poll_interval_ms: 1_000,
            golden_touch_private_key:
                "92954368afd3caa1f3ce3ead0069c1af414054aefe1ef9aeacc1bf426222ce3".to_string(),
            anchor_gas_limit: 250_000,
            beacon_genesis_time: 1_606_824_023,
            beacon_seconds_per_slot: 12,
        }
    }
}
