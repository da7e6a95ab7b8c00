use thiserror::Error;

/// Errors the proposer's epoch loop distinguishes between per-list
/// isolation (logged, next list proceeds) and epoch-aborting (§4.4
/// "Failure semantics").
#[derive(Debug, Error)]
pub enum ProposerError {
    #[error(transparent)]
    Rpc(#[from] rollup_rpc::RpcError),

    /// No configured prover endpoint accepted the assignment bid, even
    /// after exhausting the fee escalation ladder.
    #[error("no prover accepted assignment for tx list after {rounds} escalation rounds")]
    NoProverAccepted { rounds: u32 },

    #[error("tx sender rejected submission: {0}")]
    Send(#[from] tx_sender::SendError),

    #[error("submitted proposal was not mined or was reverted: {0}")]
    NotMined(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
