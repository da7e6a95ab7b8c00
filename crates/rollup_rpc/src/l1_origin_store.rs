//! Read access to the `L1Origin` records the L2 execution engine persists
//! per inserted block, via its `taiko_*` JSON-RPC namespace — the same
//! namespace the Go client's `rawdb.L1Origin` lookups (`L1OriginByID`,
//! `HeadL1Origin`) hit.

use alloy_primitives::B256;
use alloy_provider::Provider;
use serde::{Deserialize, Serialize};

use crate::client::L2Client;
use crate::error::RpcError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct L1OriginWire {
    #[serde(rename = "blockID")]
    block_id: alloy_primitives::U64,
    #[serde(rename = "l2BlockHash")]
    l2_block_hash: B256,
    #[serde(rename = "l1BlockHeight")]
    l1_block_height: alloy_primitives::U64,
    #[serde(rename = "l1BlockHash")]
    l1_block_hash: B256,
    #[serde(default)]
    throwaway: bool,
}

impl From<L1OriginWire> for rollup_types::L1Origin {
    fn from(w: L1OriginWire) -> Self {
        rollup_types::L1Origin {
            block_id: w.block_id.to(),
            l2_block_hash: w.l2_block_hash,
            l1_block_height: w.l1_block_height.to(),
            l1_block_hash: w.l1_block_hash,
            throwaway: w.throwaway,
        }
    }
}

#[derive(Clone)]
pub struct L1OriginStore {
    l2: L2Client,
}

impl L1OriginStore {
    pub fn new(l2: L2Client) -> Self {
        Self { l2 }
    }

    /// `taiko_l1OriginByID`: the `L1Origin` for the given L2 block id.
    /// Returns `NotFound` when the engine has no record for it yet — the
    /// engine's equivalent of `ethereum.NotFound`, used by callers to tell
    /// "not synced yet" apart from a genuine RPC failure.
    pub async fn by_id(&self, block_id: u64) -> Result<rollup_types::L1Origin, RpcError> {
        let result: Option<L1OriginWire> = self
            .l2
            .provider()
            .client()
            .request("taiko_l1OriginByID", (alloy_primitives::U64::from(block_id),))
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?;
        result.map(Into::into).ok_or(RpcError::NotFound("L1Origin"))
    }

    /// `taiko_headL1Origin`: the `L1Origin` of the engine's current head.
    pub async fn head(&self) -> Result<rollup_types::L1Origin, RpcError> {
        let result: Option<L1OriginWire> = self
            .l2
            .provider()
            .client()
            .request("taiko_headL1Origin", ())
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?;
        result.map(Into::into).ok_or(RpcError::NotFound("L1Origin"))
    }
}
