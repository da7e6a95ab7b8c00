//! Fetches and decodes `BlockProposed` logs from the protocol contract over
//! an inclusive L1 block range (§4.2 "Event iteration"), and recovers the
//! txlist calldata from the log's originating transaction.

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::Filter;
use alloy_sol_types::{SolCall, SolEvent};
use rollup_rpc::{L1Client, RpcError};
use rollup_types::wire::{BlockProposed, ITaikoL1};
use rollup_types::{BlockProposedEvent, DepositProcessed, L1LogLocation};

use crate::error::DriverError;

/// All `BlockProposed` events emitted by `taiko_l1` in `[from_block,
/// to_block]`, L1-ordered (ascending by block number, then log index).
pub async fn fetch_block_proposed(
    l1: &L1Client,
    taiko_l1: Address,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<BlockProposedEvent>, RpcError> {
    if from_block > to_block {
        return Ok(Vec::new());
    }

    let filter = Filter::new()
        .address(taiko_l1)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(BlockProposed::SIGNATURE_HASH);

    let logs = l1
        .provider()
        .get_logs(&filter)
        .await
        .map_err(|e| RpcError::L1Transport(e.to_string()))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let location = L1LogLocation {
            l1_block_number: log.block_number.unwrap_or_default(),
            l1_block_hash: log.block_hash.unwrap_or_default(),
            transaction_hash: log.transaction_hash.unwrap_or_default(),
            transaction_index: log.transaction_index.unwrap_or_default(),
        };

        let decoded = BlockProposed::decode_log(&log.inner, true)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding BlockProposed log: {e}")))?
            .data;

        let deposits_processed = decoded
            .depositsProcessed
            .iter()
            .map(|d| DepositProcessed { recipient: d.recipient, amount: d.amount, id: d.id })
            .collect();

        events.push(BlockProposedEvent {
            block_id: decoded.blockId.to::<u64>(),
            assigned_prover: decoded.assignedProver,
            liveness_bond: u256_to_u128(decoded.livenessBond),
            meta: decoded.meta.clone().into(),
            deposits_processed,
            location,
        });
    }

    events.sort_by_key(|e| (e.location.l1_block_number, e.location.transaction_index));
    Ok(events)
}

fn u256_to_u128(v: U256) -> u128 {
    v.try_into().unwrap_or(u128::MAX)
}

/// Recovers the raw `txList` bytes passed to `proposeBlock` in the
/// transaction that emitted `location` (§4.2 step 3-4, non-blob path).
pub async fn fetch_calldata_txlist(
    l1: &L1Client,
    location: &L1LogLocation,
) -> Result<Vec<u8>, DriverError> {
    let tx = l1
        .provider()
        .get_transaction_by_hash(location.transaction_hash)
        .await
        .map_err(|e| DriverError::Rpc(RpcError::L1Transport(e.to_string())))?
        .ok_or_else(|| DriverError::Rpc(RpcError::NotFound("originating L1 transaction")))?;

    let call = ITaikoL1::proposeBlockCall::abi_decode(&tx.input, true)
        .map_err(|e| DriverError::Other(anyhow::anyhow!("decoding proposeBlock calldata: {e}")))?;
    Ok(call.txList.to_vec())
}
