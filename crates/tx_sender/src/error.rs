use thiserror::Error;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("transaction was not mined within the configured waiting time")]
    Unmineable,

    #[error("transaction reverted on-chain: {0}")]
    Reverted(String),

    #[error("submitter shut down before this transaction was processed")]
    SubmitterStopped,

    #[error(transparent)]
    Rpc(#[from] anyhow::Error),
}
