use alloy_primitives::{Address, B256};

use crate::metadata::BlockMetadata;
use crate::transition::Transition;

/// A withdrawal the protocol asks the engine to process at the block
/// derived from one `BlockProposed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositProcessed {
    pub recipient: Address,
    pub amount: u128,
    pub id: u64,
}

/// The L1 location a log was observed at; carried alongside every decoded
/// event so the driver can recover the originating transaction and detect
/// reorgs against it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1LogLocation {
    pub l1_block_number: u64,
    pub l1_block_hash: B256,
    pub transaction_hash: B256,
    pub transaction_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProposedEvent {
    pub block_id: u64,
    pub assigned_prover: Address,
    pub liveness_bond: u128,
    pub meta: BlockMetadata,
    pub deposits_processed: Vec<DepositProcessed>,
    pub location: L1LogLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionProvedEvent {
    pub block_id: u64,
    pub transition: Transition,
    pub prover: Address,
    pub validity_bond: u128,
    pub tier: u16,
    pub location: L1LogLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContestedEvent {
    pub block_id: u64,
    pub transition: Transition,
    pub contester: Address,
    pub contest_bond: u128,
    pub tier: u16,
    pub location: L1LogLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockVerifiedEvent {
    pub block_id: u64,
    pub assigned_prover: Address,
    pub prover: Address,
    pub block_hash: B256,
    pub state_root: B256,
    pub tier: u16,
}
