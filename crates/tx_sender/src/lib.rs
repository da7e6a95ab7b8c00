//! Serialized, nonce-assigning L1 transaction submitter shared by the
//! proposer and the prover (§4.6). One [`TxSender`] owns one account: it
//! holds the account's nonce, replaces stuck transactions with fee bumps,
//! and surfaces exactly one [`Confirmation`] per accepted transaction.

mod error;
mod sender;
mod types;
mod worker;

pub use error::SendError;
pub use sender::TxSender;
pub use types::{Confirmation, Outcome, TxId, UnsignedTx};
