//! L1-to-L2 derivation: ingests `BlockProposed` events, detects and
//! recovers from L1 reorgs, builds and signs the protocol anchor
//! transaction, and drives the L2 execution engine through its block
//! production sequence (§4.2).

pub mod anchor;
pub mod engine_drive;
mod error;
pub mod events;
pub mod sync;
pub mod txlist;

pub use error::DriverError;
pub use sync::Driver;
