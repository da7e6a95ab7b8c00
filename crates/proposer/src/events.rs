//! Minimal `BlockProposed` log lookup, used only to recover the meta hash
//! of the most recently proposed block when the proposer's in-memory
//! chain cursor is cold (first proposal after a restart). Builds on the
//! same `alloy_provider`/`alloy_sol_types` pattern as
//! `driver::events::fetch_block_proposed`, scoped down to a single
//! indexed-`blockId` lookup instead of a range scan.

use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::Filter;
use alloy_sol_types::SolEvent;
use rollup_rpc::{L1Client, RpcError};
use rollup_types::wire::BlockProposed;

/// Looks up the `BlockProposed` event for `block_id` within
/// `[from_block, to_block]` and returns its meta's ABI-encoded hash.
pub async fn meta_hash_for_block_id(
    l1: &L1Client,
    taiko_l1: Address,
    block_id: u64,
    from_block: u64,
    to_block: u64,
) -> Result<Option<B256>, RpcError> {
    if from_block > to_block {
        return Ok(None);
    }
    let topic = B256::from(U256::from(block_id));
    let filter = Filter::new()
        .address(taiko_l1)
        .from_block(from_block)
        .to_block(to_block)
        .event_signature(BlockProposed::SIGNATURE_HASH)
        .topic1(topic);

    let logs = l1.provider().get_logs(&filter).await.map_err(|e| RpcError::L1Transport(e.to_string()))?;
    let Some(log) = logs.into_iter().next() else { return Ok(None) };
    let decoded = BlockProposed::decode_log(&log.inner, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding BlockProposed log: {e}")))?
        .data;
    let meta: rollup_types::BlockMetadata = decoded.meta.into();
    Ok(Some(B256::from_slice(&keccak_of(&meta.encode()))))
}

fn keccak_of(bytes: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    Keccak256::digest(bytes).into()
}
