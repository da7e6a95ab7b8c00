//! Builds the calldata for one `TaikoL1.proposeBlock` call: the
//! `blockParams` tuple (assignment hook call embedded), plus either the
//! compressed tx list as calldata or, on the blob path, an empty tx list
//! with offsets into the published blob (§4.4 step 2 "Build L1 tx
//! inputs").

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use rollup_types::wire::{AssignmentHookInputAbi, BlockParamsAbi, HookCallAbi, ITaikoL1};
use rollup_types::ProverAssignment;

use crate::assignment::WonBid;

pub struct ProposeBlockInput {
    pub params: Bytes,
    pub tx_list: Bytes,
}

#[allow(clippy::too_many_arguments)]
pub fn build_propose_block_input(
    assigned_prover: Address,
    coinbase: Address,
    extra_data: B256,
    blob_hash: B256,
    tx_list_byte_offset: u32,
    tx_list_byte_size: u32,
    parent_meta_hash: B256,
    assignment_hook: Address,
    assignment: &ProverAssignment,
    tip: U256,
    compressed_tx_list: Bytes,
    blob_used: bool,
) -> ProposeBlockInput {
    let hook_input = AssignmentHookInputAbi {
        assignment: assignment.clone().into(),
        tip,
    };

    let params = BlockParamsAbi {
        assignedProver: assigned_prover,
        coinbase,
        extraData: extra_data,
        blobHash: blob_hash,
        txListByteOffset: tx_list_byte_offset,
        txListByteSize: tx_list_byte_size,
        cacheBlobForReuse: false,
        parentMetaHash: parent_meta_hash,
        hookCalls: vec![HookCallAbi { hook: assignment_hook, data: hook_input.abi_encode().into() }],
    };

    let tx_list = if blob_used { Bytes::new() } else { compressed_tx_list };

    ProposeBlockInput { params: params.abi_encode().into(), tx_list }
}

/// Wraps `params`/`txList` into the final calldata for `proposeBlock`.
pub fn encode_propose_block_call(input: ProposeBlockInput) -> Bytes {
    ITaikoL1::proposeBlockCall { params: input.params, txList: input.tx_list }.abi_encode().into()
}

/// Builds a [`ProverAssignment`] record from a winning bid, ready to embed
/// in the `AssignmentHookInput`.
pub fn assignment_from_bid(
    bid: &WonBid,
    fee_token: Address,
    expiry: u64,
    max_block_id: u64,
    meta_hash: B256,
    parent_meta_hash: B256,
) -> ProverAssignment {
    ProverAssignment {
        fee_token,
        expiry,
        max_block_id,
        max_proposed_in: bid.max_proposed_in,
        meta_hash,
        parent_meta_hash,
        tier_fees: bid.tier_fees.clone(),
        signature: bid.signature.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nonempty_calldata_for_calldata_path() {
        let assignment = ProverAssignment {
            fee_token: Address::ZERO,
            expiry: 1_700_000_100,
            max_block_id: 1_000,
            max_proposed_in: 500,
            meta_hash: B256::ZERO,
            parent_meta_hash: B256::ZERO,
            tier_fees: vec![],
            signature: vec![1; 65],
        };
        let input = build_propose_block_input(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            B256::ZERO,
            B256::ZERO,
            0,
            3,
            B256::ZERO,
            Address::repeat_byte(3),
            &assignment,
            U256::ZERO,
            Bytes::from(vec![1, 2, 3]),
            false,
        );
        assert_eq!(input.tx_list.as_ref(), &[1, 2, 3]);
        let call = encode_propose_block_call(input);
        assert!(!call.is_empty());
    }
}
