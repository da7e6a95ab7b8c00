//! L1 reorg detection (§4.2's "Reorg detection on L1").
//!
//! Walks the chain of `L1Origin` records backwards from a candidate block
//! id until it finds an ancestor whose recorded L1 block still matches
//! current L1 state, both by its `L1Origin` entry and by the L1 snippet
//! embedded in its anchor transaction. Ports `CheckL1Reorg` +
//! `checkSyncedL1SnippetFromAnchor`.

use std::time::Duration;

use alloy_primitives::B256;
use alloy_rpc_types::Header;

use crate::client::RpcClient;
use crate::error::RpcError;

pub const WAIT_L1_ORIGIN_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_WAIT_L1_ORIGIN_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone)]
pub struct ReorgCheckResult {
    pub is_reorged: bool,
    pub l1_current_to_reset: Header,
    pub last_handled_block_id_to_reset: u64,
}

/// The L1 block hash, L1 state root, L1 height and parent gas used that an
/// anchor transaction commits to. Decoded from the first transaction of
/// the L2 block by the `driver` crate's anchor codec; passed in here so
/// this crate stays transport-agnostic about how anchor calldata is
/// parsed.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredL1Snippet {
    pub l1_block_hash: B256,
    pub l1_state_root: B256,
    pub l1_height: u64,
    pub parent_gas_used: u64,
}

/// Decodes the anchor snippet from an L2 block's first transaction.
/// Implemented by the `driver` crate, which owns the anchor tx codec;
/// `rollup_rpc` only needs the trait to keep the reorg walk free of a
/// circular crate dependency.
#[async_trait::async_trait]
pub trait AnchorSnippetReader: Send + Sync {
    async fn read_anchor_snippet(&self, l2_block_id: u64) -> Result<AnchoredL1Snippet, RpcError>;
}

/// Mirrors `CheckL1Reorg`: walks back from `block_id` while either the
/// `L1Origin`'s recorded L1 header, or the anchor-embedded L1 snippet,
/// disagrees with current L1 state. Terminates at the first matching
/// ancestor, or at genesis (using the protocol's `genesisHeight` to seed
/// the L1 cursor when the walk bottoms out).
pub async fn check_l1_reorg(
    rpc: &RpcClient,
    anchors: &dyn AnchorSnippetReader,
    mut block_id: u64,
) -> Result<ReorgCheckResult, RpcError> {
    let mut is_reorged = false;

    loop {
        if block_id == 0 {
            let state = rpc.protocol.get_protocol_state().await?;
            let header = rpc.l1.header_by_number(Some(state.genesis_height)).await?;
            return Ok(ReorgCheckResult {
                is_reorged: true,
                l1_current_to_reset: header,
                last_handled_block_id_to_reset: 0,
            });
        }

        let origin = match rpc.l1_origin.by_id(block_id).await {
            Ok(origin) => origin,
            Err(RpcError::NotFound(_)) => {
                // L2 just finished a P2P sync; no L1Origin recorded, skip
                // the check entirely rather than walking further back.
                let header = rpc.latest_l2_known_l1_header().await?;
                return Ok(ReorgCheckResult {
                    is_reorged: false,
                    l1_current_to_reset: header,
                    last_handled_block_id_to_reset: block_id,
                });
            }
            Err(e) => return Err(e),
        };

        let l1_header = match rpc.l1.header_by_number(Some(origin.l1_block_height)).await {
            Ok(header) => header,
            Err(RpcError::NotFound(_)) => {
                is_reorged = true;
                block_id -= 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if l1_header.hash != origin.l1_block_hash {
            tracing::info!(
                block_id,
                l1_height = origin.l1_block_height,
                old = %origin.l1_block_hash,
                new = %l1_header.hash,
                "L1 reorg detected via L1Origin mismatch"
            );
            is_reorged = true;
            block_id -= 1;
            continue;
        }

        if check_synced_l1_snippet_invalid(rpc, anchors, block_id, origin.l1_block_height).await? {
            is_reorged = true;
            block_id -= 1;
            continue;
        }

        return Ok(ReorgCheckResult {
            is_reorged,
            l1_current_to_reset: l1_header,
            last_handled_block_id_to_reset: origin.block_id,
        });
    }
}

async fn check_synced_l1_snippet_invalid(
    rpc: &RpcClient,
    anchors: &dyn AnchorSnippetReader,
    block_id: u64,
    l1_height: u64,
) -> Result<bool, RpcError> {
    let block = rpc.l2.header_by_number(Some(block_id)).await?;
    let parent = rpc.l2.header_by_hash(block.parent_hash).await?;
    let snippet = anchors.read_anchor_snippet(block_id).await?;

    if snippet.l1_height + 1 != l1_height {
        tracing::info!(block_id, anchored = snippet.l1_height, l1_height, "reorg: anchor L1 height mismatch");
        return Ok(true);
    }

    if snippet.parent_gas_used != parent.gas_used {
        tracing::info!(block_id, anchored = snippet.parent_gas_used, actual = parent.gas_used, "reorg: anchor parent gas used mismatch");
        return Ok(true);
    }

    let l1_header = rpc.l1.header_by_number(Some(snippet.l1_height)).await?;
    if l1_header.hash != snippet.l1_block_hash {
        tracing::info!(block_id, "reorg: anchor L1 block hash mismatch");
        return Ok(true);
    }

    Ok(false)
}
