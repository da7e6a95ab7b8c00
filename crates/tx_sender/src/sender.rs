use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use rollup_config::TxSenderConfig;
use rollup_rpc::L1Client;
use tokio::sync::{mpsc, oneshot};

use crate::error::SendError;
use crate::types::{Confirmation, TxId, UnsignedTx};
use crate::worker::{self, SendRequest};

/// A serialized, nonce-assigning submitter for one L1 account (§4.6).
/// Shared by the proposer (one proposing key) and the prover (one proving
/// key); both construct their own `TxSender` over the same `L1Client`.
///
/// `send_tx`/`send_raw` never block on network I/O — they hand the
/// transaction to the worker task's inbox and return as soon as a `TxId`
/// has been assigned.
#[derive(Clone)]
pub struct TxSender {
    address: Address,
    inbox: mpsc::UnboundedSender<SendRequest>,
    next_id: std::sync::Arc<AtomicU64>,
}

impl TxSender {
    /// Spawns the account worker and returns a handle plus its join
    /// handle, mirroring `StateTracker::spawn_refresh`'s shape.
    pub fn spawn(
        signer: PrivateKeySigner,
        l1: L1Client,
        chain_id: u64,
        config: TxSenderConfig,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let address = signer.address();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker::run(rx, l1, signer, chain_id, config));
        (Self { address, inbox: tx, next_id: std::sync::Arc::new(AtomicU64::new(1)) }, handle)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Enqueues `tx` and returns its assigned `TxId` plus a one-shot
    /// receiver that yields exactly one [`Confirmation`] once the
    /// transaction reaches a terminal state.
    pub fn send_tx(
        &self,
        tx: UnsignedTx,
    ) -> Result<(TxId, oneshot::Receiver<Confirmation>), SendError> {
        let tx_id = TxId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (confirm_tx, confirm_rx) = oneshot::channel();
        self.inbox
            .send(SendRequest { tx, tx_id, confirm: confirm_tx })
            .map_err(|_| SendError::SubmitterStopped)?;
        Ok((tx_id, confirm_rx))
    }

    /// Convenience wrapper over `send_tx` for a plain value/data call with
    /// no explicit fee fields (the worker pulls L1's suggested fees).
    pub fn send_raw(
        &self,
        to: Address,
        value: alloy_primitives::U256,
        data: alloy_primitives::Bytes,
        gas_limit: u64,
    ) -> Result<(TxId, oneshot::Receiver<Confirmation>), SendError> {
        self.send_tx(UnsignedTx { to, value, data, gas_limit, gas_fee_cap: None, gas_tip_cap: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_monotonic_tx_ids() {
        let counter = std::sync::Arc::new(AtomicU64::new(1));
        let a = TxId(counter.fetch_add(1, Ordering::Relaxed));
        let b = TxId(counter.fetch_add(1, Ordering::Relaxed));
        assert!(a.0 < b.0);
    }
}
