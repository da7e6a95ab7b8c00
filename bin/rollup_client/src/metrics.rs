//! A minimal `vise`-backed metrics registry (SPEC_FULL.md §B "Metrics"):
//! the spec scopes a metrics *server* out as an ops concern, but no
//! long-running role in this corpus ships without a handful of gauges, so
//! these are registered the way `via_btc_sender::metrics::METRICS` is,
//! just without the HTTP exporter wiring that belongs to the CLI/ops
//! surface this crate treats as an external collaborator.

use vise::{Counter, Gauge, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "rollup_client")]
pub struct RollupClientMetrics {
    /// Highest L2 block id the driver has successfully inserted.
    pub driver_last_inserted_block_id: Gauge<u64>,
    /// Number of L1 reorgs the driver has detected and recovered from.
    pub driver_reorgs_detected: Counter,
    /// Number of L1 proposals submitted by the proposer.
    pub proposer_proposals_submitted: Counter,
    /// Number of proof submissions sent by the prover.
    pub prover_proofs_submitted: Counter,
    /// Number of times the prover dropped an event due to capacity
    /// exhaustion.
    pub prover_capacity_rejections: Counter,
}

#[vise::register]
pub static METRICS: vise::Global<RollupClientMetrics> = vise::Global::new();
