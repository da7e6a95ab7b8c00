//! Proof lifecycle coordinator: tier selection and escalation, pluggable
//! proof producers, the contester cross-check policy, capacity admission,
//! and proof submission.

pub mod contest;
pub mod error;
pub mod events;
pub mod producer;
mod prover;
pub mod submission;
pub mod tier;
mod heartbeat;

pub use error::ProverError;
pub use prover::Prover;
