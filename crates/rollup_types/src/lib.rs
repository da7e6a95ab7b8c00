//! Core data model for the rollup client: the protocol-defined structures
//! that cross the L1/L2 boundary.
//!
//! This crate has no RPC, storage or async dependency of its own — it only
//! knows how to hold and (de)serialize the protocol's wire format, so that
//! `rollup_rpc`, `driver`, `proposer` and `prover` can share a single
//! definition of "what a block looks like".

pub mod assignment;
pub mod error;
pub mod events;
pub mod l1_origin;
pub mod metadata;
pub mod proof;
pub mod protocol_state;
pub mod transition;
pub mod wire;

pub use assignment::{AssignmentPayload, ProverAssignment, TierFee};
pub use error::DecodeError;
pub use events::{
    BlockProposedEvent, BlockVerifiedEvent, DepositProcessed, L1LogLocation,
    TransitionContestedEvent, TransitionProvedEvent,
};
pub use l1_origin::L1Origin;
pub use metadata::BlockMetadata;
pub use proof::{TierDescriptor, TierId, TierProof};
pub use protocol_state::{ProtocolState, TxListConfig};
pub use transition::Transition;
