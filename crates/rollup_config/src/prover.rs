use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prover mode — mutually exclusive operating stances.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProverMode {
    /// Ordinary prover: proves assigned blocks, optionally unassigned ones
    /// once their proving window expires.
    Normal,
    /// Also cross-checks every `TransitionProved` against a locally derived
    /// transition and contests mismatches.
    Contester,
    /// Approves or returns the liveness bond via the guardian prover
    /// contract instead of submitting a tiered proof.
    Guardian,
}

/// Tunables for the prover.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProverConfig {
    pub mode: ProverMode,
    /// Prove blocks whose proving window has expired even when not
    /// assigned to this prover.
    pub prove_unassigned_blocks: bool,
    pub max_concurrent_proofs: u64,
    /// Temp-capacity reservation lifetime, in milliseconds.
    pub temp_capacity_expires_ms: u64,
    /// Forced re-poll interval for events dropped by capacity admission,
    /// in milliseconds; 15s is the current default.
    pub capacity_retry_interval_ms: u64,
    /// SGX/raiko proof producer host, if configured.
    pub raiko_host: Option<String>,
    pub raiko_poll_interval_ms: u64,
    /// Guardian health-check heartbeat interval, in milliseconds; 12s is
    /// the current default.
    pub guardian_heartbeat_interval_ms: u64,
    pub guardian_health_endpoint: Option<String>,
    /// Bind address for the HTTP assignment server.
    pub http_bind_addr: SocketAddr,
    /// Maximum assignment expiry this prover will sign, in seconds from
    /// now.
    pub max_assignment_expiry_secs: u64,
    /// L1 block slippage allowed between assignment signing and proposal
    /// inclusion when computing `maxBlockId`.
    pub max_slippage_blocks: u64,
    /// Per-tier minimum fee this prover will accept in an assignment bid.
    /// A tier absent from this map has no configured minimum and any fee
    /// is accepted for it.
    pub tier_min_fees: BTreeMap<u16, u128>,
}

impl ProverConfig {
    pub fn temp_capacity_expires(&self) -> Duration {
        Duration::from_millis(self.temp_capacity_expires_ms)
    }

    pub fn capacity_retry_interval(&self) -> Duration {
        Duration::from_millis(self.capacity_retry_interval_ms)
    }

    pub fn raiko_poll_interval(&self) -> Duration {
        Duration::from_millis(self.raiko_poll_interval_ms)
    }

    pub fn guardian_heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.guardian_heartbeat_interval_ms)
    }

    pub fn for_tests() -> Self {
        Self {
            mode: ProverMode::Normal,
            prove_unassigned_blocks: true,
            max_concurrent_proofs: 4,
            temp_capacity_expires_ms: 60_000,
            capacity_retry_interval_ms: 15_000,
            raiko_host: Some("http://localhost:8091".to_string()),
            raiko_poll_interval_ms: 2_000,
            guardian_heartbeat_interval_ms: 12_000,
            guardian_health_endpoint: None,
            http_bind_addr: "0.0.0.0:9877".parse().unwrap(),
            max_assignment_expiry_secs: 3_600,
            max_slippage_blocks: 32,
            tier_min_fees: BTreeMap::from([(100, 1), (200, 1)]),
        }
    }
}
