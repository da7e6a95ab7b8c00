use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the proposer (§4.4).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProposerConfig {
    /// How often `propose_op` is attempted, in milliseconds.
    pub propose_interval_ms: u64,
    /// Minimum gap since the last proposal before an empty block is
    /// permitted, in milliseconds.
    pub min_proposing_interval_ms: u64,
    pub max_proposed_tx_lists_per_epoch: u32,
    pub min_gas_used: u64,
    pub min_tx_list_bytes: u64,
    /// Percent fee bump applied per escalation round when bidding for a
    /// prover assignment.
    pub tier_fee_price_bump_percent: u32,
    pub max_tier_fee_price_bumps: u32,
    /// `/assignment` endpoints of provers this proposer is willing to bid
    /// to, tried in order, in parallel, per round.
    pub prover_endpoints: Vec<String>,
    /// Assignment request timeout, in milliseconds.
    pub assignment_timeout_ms: u64,
    /// Whether to publish tx lists as EIP-4844 blobs instead of calldata.
    pub blob_allowed: bool,
    /// Path to a KZG trusted setup file, required when `blob_allowed` is
    /// true. Unused on the calldata-only path.
    pub kzg_trusted_setup_path: Option<PathBuf>,
}

impl ProposerConfig {
    pub fn propose_interval(&self) -> Duration {
        Duration::from_millis(self.propose_interval_ms)
    }

    pub fn min_proposing_interval(&self) -> Duration {
        Duration::from_millis(self.min_proposing_interval_ms)
    }

    pub fn assignment_timeout(&self) -> Duration {
        Duration::from_millis(self.assignment_timeout_ms)
    }

    pub fn for_tests() -> Self {
        Self {
            propose_interval_ms: 12_000,
            min_proposing_interval_ms: 60_000,
            max_proposed_tx_lists_per_epoch: 1,
            min_gas_used: 0,
            min_tx_list_bytes: 0,
            tier_fee_price_bump_percent: 10,
            max_tier_fee_price_bumps: 3,
            prover_endpoints: vec!["http://localhost:9876".to_string()],
            assignment_timeout_ms: 4_000,
            blob_allowed: false,
            kzg_trusted_setup_path: None,
        }
    }
}
