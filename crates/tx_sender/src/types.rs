use alloy_primitives::{Address, Bytes, TxHash, U256};

/// A transaction the caller wants sent, minus the one field the sender
/// owns: the nonce. Fee fields are optional — when unset, the worker
/// pulls a suggested fee from L1 and caps it at the configured maximum
/// (§4.6 "On send").
#[derive(Debug, Clone)]
pub struct UnsignedTx {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_fee_cap: Option<u128>,
    pub gas_tip_cap: Option<u128>,
}

impl UnsignedTx {
    pub fn call(to: Address, data: Bytes, gas_limit: u64) -> Self {
        Self { to, value: U256::ZERO, data, gas_limit, gas_fee_cap: None, gas_tip_cap: None }
    }
}

/// Opaque handle returned by `send_tx`/`send_raw`; the only way a caller
/// can later ask for this transaction's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub(crate) u64);

/// The terminal outcome of one submitted transaction: mined (with or
/// without a revert), permanently replaced past the fee cap, or declared
/// unmineable. Delivered exactly once per accepted `TxId` (§4.6).
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub tx_id: TxId,
    pub nonce: u64,
    pub final_tx_hash: TxHash,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Success { block_number: u64, gas_used: u64 },
    /// Mined but reverted. `reason` is the best revert reason the worker
    /// could recover by replaying the call via `eth_call` at the block it
    /// reverted in, decoded through the protocol's custom-error selector
    /// table where possible; a raw hex string or transport error message
    /// when it isn't.
    Reverted { reason: String },
    /// The mempool reported `nonce too low` for this transaction — an
    /// external transaction at the same nonce already confirmed.
    NonceTooLow,
    /// Fee bumps reached `max_gas_fee_wei` and the transaction still did
    /// not mine within `max_waiting_time`; the nonce was released via a
    /// self-cancel transaction.
    Unmineable,
}
