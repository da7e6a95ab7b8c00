use std::net::SocketAddr;
use std::path::PathBuf;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Endpoints and contract addresses shared by all three roles. Each binary
/// loads this once at startup with `envy`, layering a typed struct over
/// environment variables.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClientConfig {
    /// L1 execution node, websocket endpoint (for header/log subscriptions).
    pub l1_ws_url: String,
    /// L2 execution node, websocket endpoint.
    pub l2_ws_url: String,
    /// L2 engine API endpoint (authenticated).
    pub l2_engine_url: String,
    /// Path to the JWT secret shared with the L2 engine.
    pub jwt_secret_path: PathBuf,
    /// L1 beacon node HTTP endpoint, used to fetch blob sidecars for
    /// blob-carrying proposals. Not required when `blob_allowed` is false
    /// everywhere this config is used.
    pub l1_beacon_url: Option<String>,

    pub taiko_l1_address: Address,
    pub taiko_l2_address: Address,
    pub assignment_hook_address: Address,
    pub taiko_token_address: Address,
    pub guardian_prover_address: Option<Address>,
    /// The L2 signal service contract whose storage root a contesting
    /// prover reads to derive a transition's signal root locally.
    pub signal_service_address: Address,

    pub l1_chain_id: u64,
    pub l2_chain_id: u64,

    /// Hex-encoded secp256k1 private key used to sign L1 transactions for
    /// this role (proposer's proposing key, prover's proving key).
    pub private_key: String,

    pub metrics_addr: SocketAddr,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("ROLLUP_").from_env()
    }

    pub fn for_tests() -> Self {
        Self {
            l1_ws_url: "ws://localhost:8546".to_string(),
            l2_ws_url: "ws://localhost:9546".to_string(),
            l2_engine_url: "http://localhost:9551".to_string(),
            jwt_secret_path: PathBuf::from("/tmp/jwt.hex"),
            l1_beacon_url: Some("http://localhost:5052".to_string()),
            taiko_l1_address: Address::repeat_byte(0x11),
            taiko_l2_address: Address::repeat_byte(0x12),
            assignment_hook_address: Address::repeat_byte(0x13),
            taiko_token_address: Address::repeat_byte(0x14),
            guardian_prover_address: None,
            signal_service_address: Address::repeat_byte(0x15),
            l1_chain_id: 1,
            l2_chain_id: 167000,
            private_key: "0".repeat(64),
            metrics_addr: "127.0.0.1:9090".parse().unwrap(),
        }
    }
}
