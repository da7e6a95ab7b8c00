//! Drives one L2 block into existence through the engine API's block
//! production sequence: `forkchoiceUpdated` (with payload attributes) →
//! `getPayload` → `newPayload` → `forkchoiceUpdated` (head-only), each step
//! requiring a `VALID` status (§4.2 steps 11-12).
//!
//! The protocol's engine API extends the standard V2 payload attributes
//! with a `blockMetadata` object plus `baseFeePerGas` and `l1Origin`
//! siblings; `alloy_rpc_types_engine::PayloadAttributes` has no field for
//! any of those, so this module defines the extended shape itself and
//! flattens the standard fields into it with `#[serde(flatten)]`, the same
//! way `op-alloy`'s `OptimismPayloadAttributes` wraps the upstream type.

use alloy_primitives::{Address, B256};
use alloy_rpc_types::Withdrawal;
use alloy_rpc_types_engine::{
    ExecutionPayload, ExecutionPayloadFieldV2, ForkchoiceState, PayloadAttributes,
};
use rollup_rpc::RpcClient;
use serde::Serialize;

use crate::error::DriverError;

/// The `blockMetadata` extension object, built fresh for every block this
/// driver inserts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadataAttr {
    pub highest_block_id: u64,
    pub beneficiary: Address,
    pub gas_limit: u64,
    pub timestamp: u64,
    pub tx_list: alloy_primitives::Bytes,
    pub mix_hash: B256,
    pub extra_data: alloy_primitives::Bytes,
}

/// Standard V2 attributes plus the protocol's block-production extension.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaikoPayloadAttributes {
    #[serde(flatten)]
    pub payload_attributes: PayloadAttributes,
    pub block_metadata: BlockMetadataAttr,
    pub base_fee_per_gas: alloy_primitives::U256,
    pub l1_origin: rollup_types::L1Origin,
}

/// Everything needed to build one block's payload attributes, assembled by
/// [`crate::sync::Driver::on_block_proposed`] before calling
/// [`drive_block_insertion`].
pub struct BlockInsertionPlan {
    pub parent_hash: B256,
    pub timestamp: u64,
    pub random: B256,
    pub suggested_fee_recipient: Address,
    pub withdrawals: Vec<Withdrawal>,
    pub highest_block_id: u64,
    pub beneficiary: Address,
    pub gas_limit: u64,
    pub tx_list: Vec<u8>,
    pub mix_hash: B256,
    pub extra_data: B256,
    pub base_fee_per_gas: alloy_primitives::U256,
    pub l1_origin: rollup_types::L1Origin,
}

/// Runs the full insertion sequence for `plan`, returning the inserted
/// block's hash on success. Any non-`VALID` status at any step is a fatal
/// insertion error; the caller does not advance `lastInsertedId` (§4.2
/// step 12, "Failure semantics").
pub async fn drive_block_insertion(
    rpc: &RpcClient,
    plan: BlockInsertionPlan,
    block_id: u64,
) -> Result<B256, DriverError> {
    let attrs = TaikoPayloadAttributes {
        payload_attributes: PayloadAttributes {
            timestamp: plan.timestamp,
            prev_randao: plan.random,
            suggested_fee_recipient: plan.suggested_fee_recipient,
            withdrawals: Some(plan.withdrawals),
            parent_beacon_block_root: None,
        },
        block_metadata: BlockMetadataAttr {
            highest_block_id: plan.highest_block_id,
            beneficiary: plan.beneficiary,
            gas_limit: plan.gas_limit,
            timestamp: plan.timestamp,
            tx_list: plan.tx_list.into(),
            mix_hash: plan.mix_hash,
            extra_data: alloy_primitives::Bytes::from(plan.extra_data.to_vec()),
        },
        base_fee_per_gas: plan.base_fee_per_gas,
        l1_origin: plan.l1_origin,
    };
    let attrs_value = serde_json::to_value(&attrs)
        .map_err(|e| DriverError::Other(anyhow::anyhow!("encoding payload attributes: {e}")))?;

    let fcu_state = ForkchoiceState {
        head_block_hash: plan.parent_hash,
        safe_block_hash: plan.parent_hash,
        finalized_block_hash: plan.parent_hash,
    };

    let started = rpc
        .engine
        .fork_choice_updated_with_value(fcu_state, Some(attrs_value))
        .await
        .map_err(|e| DriverError::EngineRejected { block_id, reason: e.to_string() })?;

    let payload_id = started.payload_id.ok_or_else(|| DriverError::EngineRejected {
        block_id,
        reason: "forkchoiceUpdated did not return a payload id".to_string(),
    })?;

    let envelope = rpc
        .engine
        .get_payload(payload_id)
        .await
        .map_err(|e| DriverError::EngineRejected { block_id, reason: e.to_string() })?;

    let (payload, block_hash) = match envelope.execution_payload {
        ExecutionPayloadFieldV2::V1(v1) => {
            let hash = v1.block_hash;
            (ExecutionPayload::V1(v1), hash)
        }
        ExecutionPayloadFieldV2::V2(v2) => {
            let hash = v2.payload_inner.block_hash;
            (ExecutionPayload::V2(v2), hash)
        }
    };

    rpc.engine
        .new_payload(payload)
        .await
        .map_err(|e| DriverError::EngineRejected { block_id, reason: e.to_string() })?;

    let final_state = ForkchoiceState {
        head_block_hash: block_hash,
        safe_block_hash: block_hash,
        finalized_block_hash: plan.parent_hash,
    };
    rpc.engine
        .fork_choice_updated(final_state, None)
        .await
        .map_err(|e| DriverError::EngineRejected { block_id, reason: e.to_string() })?;

    Ok(block_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_attributes_serialize_with_taiko_extension() {
        let attrs = TaikoPayloadAttributes {
            payload_attributes: PayloadAttributes {
                timestamp: 1_700_000_000,
                prev_randao: B256::ZERO,
                suggested_fee_recipient: Address::ZERO,
                withdrawals: Some(vec![]),
                parent_beacon_block_root: None,
            },
            block_metadata: BlockMetadataAttr {
                highest_block_id: 42,
                beneficiary: Address::ZERO,
                gas_limit: 15_000_000,
                timestamp: 1_700_000_000,
                tx_list: alloy_primitives::Bytes::from(vec![1, 2, 3]),
                mix_hash: B256::ZERO,
                extra_data: alloy_primitives::Bytes::new(),
            },
            base_fee_per_gas: alloy_primitives::U256::from(1_000_000_000u64),
            l1_origin: rollup_types::L1Origin {
                block_id: 42,
                l2_block_hash: B256::ZERO,
                l1_block_height: 19_000_000,
                l1_block_hash: B256::ZERO,
                throwaway: false,
            },
        };

        let value = serde_json::to_value(&attrs).unwrap();
        assert!(value.get("timestamp").is_some());
        assert!(value.get("blockMetadata").is_some());
        assert!(value["blockMetadata"].get("highestBlockId").is_some());
        assert!(value.get("baseFeePerGas").is_some());
        assert!(value.get("l1Origin").is_some());
    }
}
