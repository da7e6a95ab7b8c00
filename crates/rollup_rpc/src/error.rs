use thiserror::Error;

/// Errors surfaced at the RPC boundary. Library-facing: every variant
/// carries enough context for a caller to decide whether to retry, while
/// remaining distinct from the `anyhow` errors used at the service-loop
/// boundary one layer up.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("L1 transport error: {0}")]
    L1Transport(String),

    #[error("L2 transport error: {0}")]
    L2Transport(String),

    #[error("engine API call failed: {0}")]
    Engine(String),

    #[error("engine API returned non-VALID payload status: {0}")]
    EnginePayloadInvalid(String),

    #[error("contract call reverted: {0}")]
    ContractReverted(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("L2 execution engine is still syncing (current={current}, highest={highest})")]
    Syncing { current: u64, highest: u64 },

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("empty proof tiers list returned by protocol")]
    EmptyTiersList,

    #[error("wire decode error: {0}")]
    Decode(#[from] rollup_types::DecodeError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
