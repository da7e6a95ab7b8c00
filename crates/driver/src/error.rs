use thiserror::Error;

/// Errors the driver's event loop distinguishes between retry (transient),
/// reset (reorg already handled internally), and propagate (fatal) — see
/// spec §7 "Propagation policy".
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Rpc(#[from] rollup_rpc::RpcError),

    /// The engine returned a non-`VALID` payload status for one of the
    /// three driving calls. Logged, the event is not applied, and
    /// iteration stops; the next invocation re-attempts (§4.2 "Failure
    /// semantics").
    #[error("engine rejected block {block_id}: {reason}")]
    EngineRejected { block_id: u64, reason: String },

    #[error("txlist decode error: {0}")]
    Decode(#[from] rollup_types::DecodeError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
