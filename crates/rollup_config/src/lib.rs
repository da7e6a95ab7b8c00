//! Typed per-role configuration, loaded from the environment the way
//! `core/lib/config`'s `ViaBtcWatchConfig`/`ViaBtcSenderConfig` do: plain
//! serde structs with a `for_tests()` constructor, no global mutable
//! config singleton.

pub mod common;
pub mod driver;
pub mod proposer;
pub mod prover;
pub mod tx_sender;

pub use common::ClientConfig;
pub use driver::DriverConfig;
pub use proposer::ProposerConfig;
pub use prover::{ProverConfig, ProverMode};
pub use tx_sender::TxSenderConfig;
