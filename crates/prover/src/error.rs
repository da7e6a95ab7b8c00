use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    #[error(transparent)]
    Rpc(#[from] rollup_rpc::RpcError),

    #[error("proof producer failed: {0}")]
    Producer(String),

    #[error("tx sender rejected submission: {0}")]
    Send(#[from] tx_sender::SendError),

    /// A non-retryable on-chain revert: the revert reason carried one of
    /// the protocol's namespaced prefixes (`L1_*`, tier-specific), so
    /// resubmitting would only repeat the same failure.
    #[error("proof submission reverted, non-retryable: {0}")]
    NonRetryableRevert(String),

    #[error("L1 block at the event's anchor height no longer matches current L1 state, aborting submission")]
    ReorgedAway,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
