//! Builds and sends the final `proveBlock`/`approve` transaction (4.5
//! "Proof submission"): re-verifies the event hasn't been reorged away,
//! classifies reverts as retryable or terminal, and hands the calldata to
//! the shared [`TxSender`].

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use rollup_rpc::{RpcClient, RpcError};
use rollup_types::wire::{IGuardianProver, ITaikoL1, ProveBlockInputAbi};
use rollup_types::{BlockMetadata, TierProof, Transition};
use tx_sender::{TxSender, UnsignedTx};

use crate::error::ProverError;

/// Namespaced revert prefixes the protocol uses for terminal, non-retryable
/// failures (4.5: "retryable iff the revert reason does not start with the
/// protocol's namespaced prefixes").
const NON_RETRYABLE_PREFIXES: &[&str] = &["L1_", "L2_", "ASSIGNMENT_"];

pub fn is_retryable(revert_reason: &str) -> bool {
    !NON_RETRYABLE_PREFIXES.iter().any(|prefix| revert_reason.starts_with(prefix))
}

/// Encodes calldata for `TaikoL1.proveBlock(blockId, input)`.
pub fn encode_prove_block_call(block_id: u64, meta: &BlockMetadata, transition: &Transition, proof: &TierProof) -> Vec<u8> {
    let input = ProveBlockInputAbi {
        meta: meta.clone().into(),
        tran: transition.clone().into(),
        proof: proof.clone().into(),
    };
    ITaikoL1::proveBlockCall { blockId: block_id, input: input.abi_encode().into() }.abi_encode()
}

/// Encodes calldata for `GuardianProver.approve(meta, transition, proof)`.
pub fn encode_guardian_approve_call(meta: &BlockMetadata, transition: &Transition, proof: &TierProof) -> Vec<u8> {
    IGuardianProver::approveCall {
        meta: meta.clone().into(),
        tran: transition.clone().into(),
        proof: proof.clone().into(),
    }
    .abi_encode()
}

/// Confirms the L1 block right after the anchor height still hashes to the
/// event's recorded hash; a mismatch means a reorg invalidated the event
/// and submission must abort rather than prove stale state.
pub async fn reverify_not_reorged(rpc: &RpcClient, l1_height: u64, expected_l1_hash: alloy_primitives::B256) -> Result<(), ProverError> {
    let header = rpc.l1.header_by_number(Some(l1_height + 1)).await?;
    if header.hash != expected_l1_hash {
        return Err(ProverError::ReorgedAway);
    }
    Ok(())
}

pub struct SubmissionTarget {
    pub to: Address,
    pub calldata: Vec<u8>,
}

pub fn build_target(
    taiko_l1: Address,
    guardian_prover: Option<Address>,
    is_guardian_approval: bool,
    block_id: u64,
    meta: &BlockMetadata,
    transition: &Transition,
    proof: &TierProof,
) -> Result<SubmissionTarget, ProverError> {
    if is_guardian_approval {
        let to = guardian_prover
            .ok_or_else(|| ProverError::Other(anyhow::anyhow!("guardian approval requested but no guardian prover address configured")))?;
        Ok(SubmissionTarget { to, calldata: encode_guardian_approve_call(meta, transition, proof) })
    } else {
        Ok(SubmissionTarget { to: taiko_l1, calldata: encode_prove_block_call(block_id, meta, transition, proof) })
    }
}

/// Sends `target` through `tx_sender` and classifies the terminal outcome.
/// A revert whose reason is retryable is surfaced as [`ProverError::Rpc`]
/// so the caller's normal retry-next-tick path applies; a non-retryable
/// revert or an unmineable tx is terminal for this block.
pub async fn submit(tx_sender: &TxSender, target: SubmissionTarget, gas_limit: u64) -> Result<(), ProverError> {
    let (_tx_id, confirm) = tx_sender.send_raw(target.to, U256::ZERO, target.calldata.into(), gas_limit)?;
    let confirmation = confirm
        .await
        .map_err(|_| ProverError::Other(anyhow::anyhow!("tx sender dropped confirmation channel")))?;

    match confirmation.outcome {
        tx_sender::Outcome::Success { .. } => Ok(()),
        tx_sender::Outcome::Reverted { reason } => {
            if is_retryable(&reason) {
                Err(ProverError::Rpc(RpcError::Other(anyhow::anyhow!("proveBlock/approve reverted with retryable reason: {reason}"))))
            } else {
                Err(ProverError::NonRetryableRevert(reason))
            }
        }
        tx_sender::Outcome::NonceTooLow => Err(ProverError::Rpc(RpcError::Other(anyhow::anyhow!("nonce too low, will resubmit")))),
        tx_sender::Outcome::Unmineable => Err(ProverError::NonRetryableRevert("proveBlock/approve did not mine within the tx sender's deadline".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_prefixes_are_not_retryable() {
        assert!(!is_retryable("L1_ALREADY_PROVEN"));
        assert!(!is_retryable("L2_TOO_LATE"));
        assert!(!is_retryable("ASSIGNMENT_EXPIRED"));
    }

    #[test]
    fn unrecognized_reverts_are_retryable() {
        assert!(is_retryable("out of gas"));
        assert!(is_retryable("0xdeadbeef"));
    }

    #[test]
    fn guardian_target_requires_configured_address() {
        let meta = sample_meta();
        let transition = sample_transition();
        let proof = TierProof { tier: 100, data: vec![] };
        let err = build_target(Address::ZERO, None, true, 1, &meta, &transition, &proof).unwrap_err();
        assert!(matches!(err, ProverError::Other(_)));
    }

    #[test]
    fn normal_target_goes_to_taiko_l1() {
        let meta = sample_meta();
        let transition = sample_transition();
        let proof = TierProof { tier: 100, data: vec![] };
        let taiko_l1 = Address::repeat_byte(9);
        let target = build_target(taiko_l1, None, false, 1, &meta, &transition, &proof).unwrap();
        assert_eq!(target.to, taiko_l1);
        assert!(!target.calldata.is_empty());
    }

    fn sample_meta() -> BlockMetadata {
        BlockMetadata {
            l1_hash: Default::default(),
            difficulty: Default::default(),
            blob_hash: Default::default(),
            extra_data: Default::default(),
            deposits_hash: Default::default(),
            coinbase: Address::ZERO,
            id: 1,
            gas_limit: 0,
            timestamp: 0,
            l1_height: 0,
            tx_list_byte_offset: 0,
            tx_list_byte_size: 0,
            min_tier: 100,
            blob_used: false,
            parent_meta_hash: Default::default(),
        }
    }

    fn sample_transition() -> Transition {
        Transition {
            parent_hash: Default::default(),
            block_hash: Default::default(),
            state_root: Default::default(),
            graffiti: Default::default(),
        }
    }
}
