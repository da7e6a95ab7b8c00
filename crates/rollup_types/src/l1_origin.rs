use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Driver-maintained record mapping one L2 block to the L1 block it was
/// derived from. Persisted by the L2 engine; read back by the driver and
/// prover for reorg detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Origin {
    pub block_id: u64,
    pub l2_block_hash: B256,
    pub l1_block_height: u64,
    pub l1_block_hash: B256,
    /// Set when this block's txlist failed validation and an empty list
    /// was substituted. Not a protocol invariant, purely a hint for
    /// downstream readers distinguishing "validly empty" from "coerced
    /// empty" blocks.
    pub throwaway: bool,
}

impl L1Origin {
    pub fn is_genesis(&self) -> bool {
        self.block_id == 0
    }
}
