//! Log scans for the three protocol events the prover reacts to besides
//! `BlockProposed` (which `driver::events::fetch_block_proposed` already
//! covers and the prover reuses directly).

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::Filter;
use alloy_sol_types::SolEvent;
use rollup_rpc::{L1Client, RpcError};
use rollup_types::wire::{BlockProposed, BlockVerified, TransitionContested, TransitionProved};
use rollup_types::{
    BlockProposedEvent, BlockVerifiedEvent, DepositProcessed, L1LogLocation, TransitionContestedEvent,
    TransitionProvedEvent,
};

/// Same range-scan shape as `driver::events::fetch_block_proposed`,
/// duplicated here rather than taken as a cross-crate dependency on
/// `driver` since the prover has no other use for that crate.
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
    let logs = l1.provider().get_logs(&filter).await.map_err(|e| RpcError::L1Transport(e.to_string()))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let location = location_of(&log);
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

pub async fn fetch_transition_proved(
    l1: &L1Client,
    taiko_l1: Address,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<TransitionProvedEvent>, RpcError> {
    if from_block > to_block {
        return Ok(Vec::new());
    }
    let filter = Filter::new()
        .address(taiko_l1)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(TransitionProved::SIGNATURE_HASH);
    let logs = l1.provider().get_logs(&filter).await.map_err(|e| RpcError::L1Transport(e.to_string()))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let location = location_of(&log);
        let decoded = TransitionProved::decode_log(&log.inner, true)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding TransitionProved log: {e}")))?
            .data;
        events.push(TransitionProvedEvent {
            block_id: decoded.blockId.to::<u64>(),
            transition: decoded.tran.into(),
            prover: decoded.prover,
            validity_bond: u256_to_u128(decoded.validityBond),
            tier: decoded.tier,
            location,
        });
    }
    events.sort_by_key(|e| (e.location.l1_block_number, e.location.transaction_index));
    Ok(events)
}

pub async fn fetch_transition_contested(
    l1: &L1Client,
    taiko_l1: Address,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<TransitionContestedEvent>, RpcError> {
    if from_block > to_block {
        return Ok(Vec::new());
    }
    let filter = Filter::new()
        .address(taiko_l1)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(TransitionContested::SIGNATURE_HASH);
    let logs = l1.provider().get_logs(&filter).await.map_err(|e| RpcError::L1Transport(e.to_string()))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let location = location_of(&log);
        let decoded = TransitionContested::decode_log(&log.inner, true)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding TransitionContested log: {e}")))?
            .data;
        events.push(TransitionContestedEvent {
            block_id: decoded.blockId.to::<u64>(),
            transition: decoded.tran.into(),
            contester: decoded.contester,
            contest_bond: u256_to_u128(decoded.contestBond),
            tier: decoded.tier,
            location,
        });
    }
    events.sort_by_key(|e| (e.location.l1_block_number, e.location.transaction_index));
    Ok(events)
}

pub async fn fetch_block_verified(
    l1: &L1Client,
    taiko_l1: Address,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<BlockVerifiedEvent>, RpcError> {
    if from_block > to_block {
        return Ok(Vec::new());
    }
    let filter = Filter::new()
        .address(taiko_l1)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(BlockVerified::SIGNATURE_HASH);
    let logs = l1.provider().get_logs(&filter).await.map_err(|e| RpcError::L1Transport(e.to_string()))?;

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let decoded = BlockVerified::decode_log(&log.inner, true)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding BlockVerified log: {e}")))?
            .data;
        events.push(BlockVerifiedEvent {
            block_id: decoded.blockId.to::<u64>(),
            assigned_prover: decoded.assignedProver,
            prover: decoded.prover,
            block_hash: decoded.blockHash,
            state_root: decoded.stateRoot,
            tier: decoded.tier,
        });
    }
    Ok(events)
}

fn location_of(log: &alloy_rpc_types::Log) -> L1LogLocation {
    L1LogLocation {
        l1_block_number: log.block_number.unwrap_or_default(),
        l1_block_hash: log.block_hash.unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
        transaction_index: log.transaction_index.unwrap_or_default(),
    }
}

fn u256_to_u128(v: U256) -> u128 {
    v.try_into().unwrap_or(u128::MAX)
}
