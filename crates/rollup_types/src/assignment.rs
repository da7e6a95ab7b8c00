use alloy_primitives::{Address, B256};
use alloy_sol_types::SolValue;
use sha3::{Digest, Keccak256};

use crate::error::DecodeError;
use crate::proof::TierId;
use crate::wire::{ProverAssignmentAbi, ProverAssignmentPayloadAbi, TierFeeAbi};

const ASSIGNMENT_INTENT: &str = "PROVER_ASSIGNMENT";

/// A single tier's fee offered in an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierFee {
    pub tier: TierId,
    pub fee: u128,
}

/// A signed off-chain commitment by a prover to prove a future proposed
/// block by a stated expiry in exchange for stated tier fees.
///
/// `fee_token` is always the zero address (native token); the signature is
/// over an EIP-712-style payload that commits to chain id, protocol
/// address, hook address, metas, blob hash, fee token, and tier fees (see
/// [`AssignmentPayload`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverAssignment {
    pub fee_token: Address,
    pub expiry: u64,
    pub max_block_id: u64,
    pub max_proposed_in: u64,
    pub meta_hash: B256,
    pub parent_meta_hash: B256,
    pub tier_fees: Vec<TierFee>,
    pub signature: Vec<u8>,
}

impl ProverAssignment {
    pub fn encode(&self) -> Vec<u8> {
        ProverAssignmentAbi::from(self.clone()).abi_encode()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let abi = ProverAssignmentAbi::abi_decode(bytes, true)
            .map_err(|e| DecodeError::Abi(e.to_string()))?;
        Ok(abi.into())
    }
}

impl From<ProverAssignment> for ProverAssignmentAbi {
    fn from(a: ProverAssignment) -> Self {
        ProverAssignmentAbi {
            feeToken: a.fee_token,
            expiry: a.expiry,
            maxBlockId: a.max_block_id,
            maxProposedIn: a.max_proposed_in,
            metaHash: a.meta_hash,
            parentMetaHash: a.parent_meta_hash,
            tierFees: a
                .tier_fees
                .into_iter()
                .map(|f| TierFeeAbi { tier: f.tier, fee: f.fee })
                .collect(),
            signature: a.signature.into(),
        }
    }
}

impl From<ProverAssignmentAbi> for ProverAssignment {
    fn from(a: ProverAssignmentAbi) -> Self {
        ProverAssignment {
            fee_token: a.feeToken,
            expiry: a.expiry,
            max_block_id: a.maxBlockId,
            max_proposed_in: a.maxProposedIn,
            meta_hash: a.metaHash,
            parent_meta_hash: a.parentMetaHash,
            tier_fees: a
                .tierFees
                .into_iter()
                .map(|f| TierFee { tier: f.tier, fee: f.fee })
                .collect(),
            signature: a.signature.into(),
        }
    }
}

/// The data an assignment signature commits to. Distinct from
/// [`ProverAssignment`] because the payload carries the chain id and
/// contract addresses that the assignment record itself does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentPayload {
    pub chain_id: u64,
    pub taiko_l1: Address,
    pub assignment_hook: Address,
    pub meta_hash: B256,
    pub parent_meta_hash: B256,
    pub blob_hash: B256,
    pub fee_token: Address,
    pub expiry: u64,
    pub max_block_id: u64,
    pub max_proposed_in: u64,
    pub tier_fees: Vec<TierFee>,
}

impl AssignmentPayload {
    /// keccak256 of the ABI-encoded payload tuple; this is the digest that
    /// gets signed (and verified) as the assignment signature.
    pub fn digest(&self) -> B256 {
        let abi = ProverAssignmentPayloadAbi {
            intent: ASSIGNMENT_INTENT.to_string(),
            chainId: self.chain_id,
            taikoL1: self.taiko_l1,
            assignmentHook: self.assignment_hook,
            metaHash: self.meta_hash,
            parentMetaHash: self.parent_meta_hash,
            blobHash: self.blob_hash,
            feeToken: self.fee_token,
            expiry: self.expiry,
            maxBlockId: self.max_block_id,
            maxProposedIn: self.max_proposed_in,
            tierFees: self
                .tier_fees
                .iter()
                .map(|f| TierFeeAbi { tier: f.tier, fee: f.fee })
                .collect(),
        };
        let encoded = abi.abi_encode();
        B256::from_slice(Keccak256::digest(encoded).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_round_trips() {
        let a = ProverAssignment {
            fee_token: Address::ZERO,
            expiry: 1_700_000_100,
            max_block_id: 1_000,
            max_proposed_in: 500,
            meta_hash: B256::repeat_byte(1),
            parent_meta_hash: B256::repeat_byte(2),
            tier_fees: vec![TierFee { tier: 100, fee: 10_000 }, TierFee { tier: 200, fee: 50_000 }],
            signature: vec![1; 65],
        };
        assert_eq!(ProverAssignment::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn digest_is_sensitive_to_every_field() {
        let base = AssignmentPayload {
            chain_id: 1,
            taiko_l1: Address::repeat_byte(1),
            assignment_hook: Address::repeat_byte(2),
            meta_hash: B256::ZERO,
            parent_meta_hash: B256::ZERO,
            blob_hash: B256::ZERO,
            fee_token: Address::ZERO,
            expiry: 100,
            max_block_id: 10,
            max_proposed_in: 5,
            tier_fees: vec![TierFee { tier: 100, fee: 1 }],
        };
        let mut changed = base.clone();
        changed.expiry += 1;
        assert_ne!(base.digest(), changed.digest());

        let mut changed_fee = base.clone();
        changed_fee.tier_fees[0].fee += 1;
        assert_ne!(base.digest(), changed_fee.digest());
    }
}
