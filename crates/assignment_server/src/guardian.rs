//! `/signedBlocks`: an optional key-value record of guardian-approved
//! blocks (§6 "Persisted state" — "Optional guardian server may keep a
//! key-value store of signed block records keyed by blockId"). Kept as
//! an in-process map; nothing in the spec requires this to survive a
//! restart.

use std::sync::Arc;

use alloy_primitives::B256;
use axum::extract::{Query, State};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::api::AssignmentServerState;

static SIGNED_BLOCKS: Lazy<DashMap<u64, SignedBlockRecord>> = Lazy::new(DashMap::new);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedBlockRecord {
    pub block_id: u64,
    pub block_hash: B256,
    pub signature: alloy_primitives::Bytes,
}

#[derive(Debug, Deserialize)]
pub struct SignedBlocksQuery {
    pub block_id: u64,
}

/// `GET /signedBlocks?blockId=N`: returns the guardian's recorded
/// approval for a block id, if any.
pub async fn signed_blocks(
    State(_state): State<Arc<AssignmentServerState>>,
    Query(q): Query<SignedBlocksQuery>,
) -> axum::Json<Option<SignedBlockRecord>> {
    axum::Json(SIGNED_BLOCKS.get(&q.block_id).map(|r| r.clone()))
}

/// `POST /signedBlocks`: records a guardian approval, overwriting any
/// prior record for the same block id.
pub async fn record_signed_block(
    State(_state): State<Arc<AssignmentServerState>>,
    axum::Json(record): axum::Json<SignedBlockRecord>,
) -> axum::Json<()> {
    SIGNED_BLOCKS.insert(record.block_id, record);
    axum::Json(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_serde() {
        let record = SignedBlockRecord {
            block_id: 7,
            block_hash: B256::repeat_byte(3),
            signature: vec![1, 2, 3].into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: SignedBlockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.block_id, 7);
        assert_eq!(back.block_hash, record.block_hash);
    }
}
