//! §6 CLI surface: three subcommands (`driver | proposer | prover`), each
//! taking endpoint URLs, contract addresses, a signing key, the JWT
//! secret path, a metrics bind address, and component-specific tunables.
//! Every flag also reads from its `env` fallback (clap's `env` feature),
//! matching the teacher's `zksync_server` CLI style of `clap::Parser`
//! derive structs.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Rollup client: driver, proposer and prover roles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Role,
}

#[derive(Debug, Subcommand)]
pub enum Role {
    /// Derives the L2 chain from L1 `BlockProposed` events.
    Driver(DriverArgs),
    /// Batches L2 mempool transactions into L1 proposals.
    Proposer(ProposerArgs),
    /// Produces and submits validity proofs for proposed blocks.
    Prover(ProverArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "ROLLUP_L1_WS_URL")]
    pub l1_ws_url: String,
    #[arg(long, env = "ROLLUP_L2_WS_URL")]
    pub l2_ws_url: String,
    #[arg(long, env = "ROLLUP_L2_ENGINE_URL")]
    pub l2_engine_url: String,
    #[arg(long, env = "ROLLUP_JWT_SECRET_PATH")]
    pub jwt_secret_path: PathBuf,
    #[arg(long, env = "ROLLUP_L1_BEACON_URL")]
    pub l1_beacon_url: Option<String>,

    #[arg(long, env = "ROLLUP_TAIKO_L1_ADDRESS")]
    pub taiko_l1_address: Address,
    #[arg(long, env = "ROLLUP_TAIKO_L2_ADDRESS")]
    pub taiko_l2_address: Address,
    #[arg(long, env = "ROLLUP_ASSIGNMENT_HOOK_ADDRESS")]
    pub assignment_hook_address: Address,
    #[arg(long, env = "ROLLUP_TAIKO_TOKEN_ADDRESS")]
    pub taiko_token_address: Address,
    #[arg(long, env = "ROLLUP_GUARDIAN_PROVER_ADDRESS")]
    pub guardian_prover_address: Option<Address>,
    #[arg(long, env = "ROLLUP_SIGNAL_SERVICE_ADDRESS")]
    pub signal_service_address: Address,

    #[arg(long, env = "ROLLUP_L1_CHAIN_ID")]
    pub l1_chain_id: u64,
    #[arg(long, env = "ROLLUP_L2_CHAIN_ID")]
    pub l2_chain_id: u64,

    /// Hex-encoded secp256k1 private key signing this role's L1
    /// transactions.
    #[arg(long, env = "ROLLUP_PRIVATE_KEY")]
    pub private_key: String,

    #[arg(long, env = "ROLLUP_METRICS_ADDR", default_value = "0.0.0.0:9090")]
    pub metrics_addr: SocketAddr,

    /// `plain` or `json`; matches `ObservabilityConfig::log_format`'s two
    /// supported values.
    #[arg(long, env = "ROLLUP_LOG_FORMAT", default_value = "plain")]
    pub log_format: String,
}

impl CommonArgs {
    pub fn into_config(self) -> rollup_config::ClientConfig {
        rollup_config::ClientConfig {
            l1_ws_url: self.l1_ws_url,
            l2_ws_url: self.l2_ws_url,
            l2_engine_url: self.l2_engine_url,
            jwt_secret_path: self.jwt_secret_path,
            l1_beacon_url: self.l1_beacon_url,
            taiko_l1_address: self.taiko_l1_address,
            taiko_l2_address: self.taiko_l2_address,
            assignment_hook_address: self.assignment_hook_address,
            taiko_token_address: self.taiko_token_address,
            guardian_prover_address: self.guardian_prover_address,
            signal_service_address: self.signal_service_address,
            l1_chain_id: self.l1_chain_id,
            l2_chain_id: self.l2_chain_id,
            private_key: self.private_key,
            metrics_addr: self.metrics_addr,
        }
    }
}

#[derive(Debug, Args)]
pub struct DriverArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, env = "ROLLUP_DRIVER_P2P_SYNC_VERIFIED_BLOCKS", default_value_t = false)]
    pub p2p_sync_verified_blocks: bool,
    #[arg(long, env = "ROLLUP_DRIVER_P2P_SYNC_TIMEOUT_MS", default_value_t = 30_000)]
    pub p2p_sync_timeout_ms: u64,
    #[arg(long, env = "ROLLUP_DRIVER_MAX_L1_BLOCKS_PER_ITERATION", default_value_t = 1_000)]
    pub max_l1_blocks_per_iteration: u64,
    #[arg(long, env = "ROLLUP_DRIVER_WAIT_L1_ORIGIN_TIMEOUT_MS", default_value_t = 180_000)]
    pub wait_l1_origin_timeout_ms: u64,
    #[arg(long, env = "ROLLUP_DRIVER_POLL_INTERVAL_MS", default_value_t = 1_000)]
    pub poll_interval_ms: u64,
    /// Hex-encoded golden-touch private key (see GLOSSARY); the fixed L2
    /// account authorized to sign anchor transactions.
    #[arg(long, env = "ROLLUP_DRIVER_GOLDEN_TOUCH_PRIVATE_KEY")]
    pub golden_touch_private_key: String,
    #[arg(long, env = "ROLLUP_DRIVER_ANCHOR_GAS_LIMIT", default_value_t = 250_000)]
    pub anchor_gas_limit: u64,
    #[arg(long, env = "ROLLUP_DRIVER_BEACON_GENESIS_TIME", default_value_t = 1_606_824_023)]
    pub beacon_genesis_time: u64,
    #[arg(long, env = "ROLLUP_DRIVER_BEACON_SECONDS_PER_SLOT", default_value_t = 12)]
    pub beacon_seconds_per_slot: u64,
}

impl DriverArgs {
    pub fn into_config(self) -> rollup_config::DriverConfig {
        rollup_config::DriverConfig {
            p2p_sync_verified_blocks: self.p2p_sync_verified_blocks,
            p2p_sync_timeout_ms: self.p2p_sync_timeout_ms,
            max_l1_blocks_per_iteration: self.max_l1_blocks_per_iteration,
            wait_l1_origin_timeout_ms: self.wait_l1_origin_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            golden_touch_private_key: self.golden_touch_private_key,
            anchor_gas_limit: self.anchor_gas_limit,
            beacon_genesis_time: self.beacon_genesis_time,
            beacon_seconds_per_slot: self.beacon_seconds_per_slot,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProposerArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, env = "ROLLUP_PROPOSER_PROPOSE_INTERVAL_MS", default_value_t = 12_000)]
    pub propose_interval_ms: u64,
    #[arg(long, env = "ROLLUP_PROPOSER_MIN_PROPOSING_INTERVAL_MS", default_value_t = 60_000)]
    pub min_proposing_interval_ms: u64,
    #[arg(long, env = "ROLLUP_PROPOSER_MAX_TX_LISTS_PER_EPOCH", default_value_t = 1)]
    pub max_proposed_tx_lists_per_epoch: u32,
    #[arg(long, env = "ROLLUP_PROPOSER_MIN_GAS_USED", default_value_t = 0)]
    pub min_gas_used: u64,
    #[arg(long, env = "ROLLUP_PROPOSER_MIN_TX_LIST_BYTES", default_value_t = 0)]
    pub min_tx_list_bytes: u64,
    #[arg(long, env = "ROLLUP_PROPOSER_TIER_FEE_PRICE_BUMP_PERCENT", default_value_t = 10)]
    pub tier_fee_price_bump_percent: u32,
    #[arg(long, env = "ROLLUP_PROPOSER_MAX_TIER_FEE_PRICE_BUMPS", default_value_t = 3)]
    pub max_tier_fee_price_bumps: u32,
    /// Comma-separated list of prover `/assignment` base URLs.
    #[arg(long, env = "ROLLUP_PROPOSER_PROVER_ENDPOINTS", value_delimiter = ',')]
    pub prover_endpoints: Vec<String>,
    #[arg(long, env = "ROLLUP_PROPOSER_ASSIGNMENT_TIMEOUT_MS", default_value_t = 4_000)]
    pub assignment_timeout_ms: u64,
    #[arg(long, env = "ROLLUP_PROPOSER_BLOB_ALLOWED", default_value_t = false)]
    pub blob_allowed: bool,
    #[arg(long, env = "ROLLUP_PROPOSER_KZG_TRUSTED_SETUP_PATH")]
    pub kzg_trusted_setup_path: Option<PathBuf>,

    #[command(flatten)]
    pub tx_sender: TxSenderArgs,
}

impl ProposerArgs {
    pub fn into_config(self) -> rollup_config::ProposerConfig {
        rollup_config::ProposerConfig {
            propose_interval_ms: self.propose_interval_ms,
            min_proposing_interval_ms: self.min_proposing_interval_ms,
            max_proposed_tx_lists_per_epoch: self.max_proposed_tx_lists_per_epoch,
            min_gas_used: self.min_gas_used,
            min_tx_list_bytes: self.min_tx_list_bytes,
            tier_fee_price_bump_percent: self.tier_fee_price_bump_percent,
            max_tier_fee_price_bumps: self.max_tier_fee_price_bumps,
            prover_endpoints: self.prover_endpoints,
            assignment_timeout_ms: self.assignment_timeout_ms,
            blob_allowed: self.blob_allowed,
            kzg_trusted_setup_path: self.kzg_trusted_setup_path,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProverArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, env = "ROLLUP_PROVER_MODE", default_value = "normal")]
    pub mode: ProverModeArg,
    #[arg(long, env = "ROLLUP_PROVER_PROVE_UNASSIGNED_BLOCKS", default_value_t = true)]
    pub prove_unassigned_blocks: bool,
    #[arg(long, env = "ROLLUP_PROVER_MAX_CONCURRENT_PROOFS", default_value_t = 4)]
    pub max_concurrent_proofs: u64,
    #[arg(long, env = "ROLLUP_PROVER_TEMP_CAPACITY_EXPIRES_MS", default_value_t = 60_000)]
    pub temp_capacity_expires_ms: u64,
    #[arg(long, env = "ROLLUP_PROVER_CAPACITY_RETRY_INTERVAL_MS", default_value_t = 15_000)]
    pub capacity_retry_interval_ms: u64,
    #[arg(long, env = "ROLLUP_PROVER_RAIKO_HOST")]
    pub raiko_host: Option<String>,
    #[arg(long, env = "ROLLUP_PROVER_RAIKO_POLL_INTERVAL_MS", default_value_t = 2_000)]
    pub raiko_poll_interval_ms: u64,
    #[arg(long, env = "ROLLUP_PROVER_GUARDIAN_HEARTBEAT_INTERVAL_MS", default_value_t = 12_000)]
    pub guardian_heartbeat_interval_ms: u64,
    #[arg(long, env = "ROLLUP_PROVER_GUARDIAN_HEALTH_ENDPOINT")]
    pub guardian_health_endpoint: Option<String>,
    #[arg(long, env = "ROLLUP_PROVER_HTTP_BIND_ADDR", default_value = "0.0.0.0:9876")]
    pub http_bind_addr: SocketAddr,
    #[arg(long, env = "ROLLUP_PROVER_MAX_ASSIGNMENT_EXPIRY_SECS", default_value_t = 3_600)]
    pub max_assignment_expiry_secs: u64,
    #[arg(long, env = "ROLLUP_PROVER_MAX_SLIPPAGE_BLOCKS", default_value_t = 32)]
    pub max_slippage_blocks: u64,
    /// `tier:minFeeWei` pairs, comma-separated, e.g. `100:1000,200:5000`.
    #[arg(long, env = "ROLLUP_PROVER_TIER_MIN_FEES", value_delimiter = ',')]
    pub tier_min_fees: Vec<String>,

    #[command(flatten)]
    pub tx_sender: TxSenderArgs,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProverModeArg {
    Normal,
    Contester,
    Guardian,
}

impl From<ProverModeArg> for rollup_config::ProverMode {
    fn from(m: ProverModeArg) -> Self {
        match m {
            ProverModeArg::Normal => rollup_config::ProverMode::Normal,
            ProverModeArg::Contester => rollup_config::ProverMode::Contester,
            ProverModeArg::Guardian => rollup_config::ProverMode::Guardian,
        }
    }
}

impl ProverArgs {
    pub fn into_config(self) -> anyhow::Result<rollup_config::ProverConfig> {
        let mut tier_min_fees = BTreeMap::new();
        for pair in &self.tier_min_fees {
            let (tier, fee) = pair
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("malformed tier:fee pair {pair:?}"))?;
            tier_min_fees.insert(tier.parse()?, fee.parse()?);
        }

        Ok(rollup_config::ProverConfig {
            mode: self.mode.into(),
            prove_unassigned_blocks: self.prove_unassigned_blocks,
            max_concurrent_proofs: self.max_concurrent_proofs,
            temp_capacity_expires_ms: self.temp_capacity_expires_ms,
            capacity_retry_interval_ms: self.capacity_retry_interval_ms,
            raiko_host: self.raiko_host,
            raiko_poll_interval_ms: self.raiko_poll_interval_ms,
            guardian_heartbeat_interval_ms: self.guardian_heartbeat_interval_ms,
            guardian_health_endpoint: self.guardian_health_endpoint,
            http_bind_addr: self.http_bind_addr,
            max_assignment_expiry_secs: self.max_assignment_expiry_secs,
            max_slippage_blocks: self.max_slippage_blocks,
            tier_min_fees,
        })
    }
}

#[derive(Debug, Args, Clone)]
pub struct TxSenderArgs {
    #[arg(long, env = "ROLLUP_TX_SENDER_MAX_GAS_FEE_WEI", default_value_t = 100_000_000_000)]
    pub max_gas_fee_wei: u128,
    #[arg(long, env = "ROLLUP_TX_SENDER_GAS_GROWTH_RATE_PERCENT", default_value_t = 50)]
    pub gas_growth_rate_percent: u32,
    #[arg(long, env = "ROLLUP_TX_SENDER_REPLACEMENT_INTERVAL_MS", default_value_t = 20_000)]
    pub replacement_interval_ms: u64,
    #[arg(long, env = "ROLLUP_TX_SENDER_MAX_WAITING_TIME_MS", default_value_t = 360_000)]
    pub max_waiting_time_ms: u64,
    #[arg(long, env = "ROLLUP_TX_SENDER_CONFIRMATION_POLL_INTERVAL_MS", default_value_t = 3_000)]
    pub confirmation_poll_interval_ms: u64,
}

impl TxSenderArgs {
    pub fn into_config(self) -> rollup_config::TxSenderConfig {
        rollup_config::TxSenderConfig {
            max_gas_fee_wei: self.max_gas_fee_wei,
            gas_growth_rate_percent: self.gas_growth_rate_percent,
            replacement_interval_ms: self.replacement_interval_ms,
            max_waiting_time_ms: self.max_waiting_time_ms,
            confirmation_poll_interval_ms: self.confirmation_poll_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_min_fees_parses_colon_pairs() {
        let args = ProverArgs {
            common: test_common(),
            mode: ProverModeArg::Normal,
            prove_unassigned_blocks: true,
            max_concurrent_proofs: 1,
            temp_capacity_expires_ms: 1,
            capacity_retry_interval_ms: 1,
            raiko_host: None,
            raiko_poll_interval_ms: 1,
            guardian_heartbeat_interval_ms: 1,
            guardian_health_endpoint: None,
            http_bind_addr: "0.0.0.0:9876".parse().unwrap(),
            max_assignment_expiry_secs: 1,
            max_slippage_blocks: 1,
            tier_min_fees: vec!["100:1000".to_string(), "200:5000".to_string()],
            tx_sender: test_tx_sender(),
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.tier_min_fees.get(&100), Some(&1000));
        assert_eq!(config.tier_min_fees.get(&200), Some(&5000));
    }

    #[test]
    fn malformed_tier_fee_pair_is_rejected() {
        let mut args = ProverArgs {
            common: test_common(),
            mode: ProverModeArg::Normal,
            prove_unassigned_blocks: true,
            max_concurrent_proofs: 1,
            temp_capacity_expires_ms: 1,
            capacity_retry_interval_ms: 1,
            raiko_host: None,
            raiko_poll_interval_ms: 1,
            guardian_heartbeat_interval_ms: 1,
            guardian_health_endpoint: None,
            http_bind_addr: "0.0.0.0:9876".parse().unwrap(),
            max_assignment_expiry_secs: 1,
            max_slippage_blocks: 1,
            tier_min_fees: vec!["not-a-pair".to_string()],
            tx_sender: test_tx_sender(),
        };
        assert!(args.into_config().is_err());
        args.tier_min_fees = vec![];
        assert!(args.into_config().is_ok());
    }

    fn test_common() -> CommonArgs {
        CommonArgs {
            l1_ws_url: "ws://localhost:8546".to_string(),
            l2_ws_url: "ws://localhost:9546".to_string(),
            l2_engine_url: "http://localhost:9551".to_string(),
            jwt_secret_path: PathBuf::from("/tmp/jwt.hex"),
            l1_beacon_url: None,
            taiko_l1_address: Address::ZERO,
            taiko_l2_address: Address::ZERO,
            assignment_hook_address: Address::ZERO,
            taiko_token_address: Address::ZERO,
            guardian_prover_address: None,
            signal_service_address: Address::ZERO,
            l1_chain_id: 1,
            l2_chain_id: 167000,
            private_key: "0".repeat(64),
            metrics_addr: "127.0.0.1:9090".parse().unwrap(),
            log_format: "plain".to_string(),
        }
    }

    fn test_tx_sender() -> TxSenderArgs {
        TxSenderArgs {
            max_gas_fee_wei: 1,
            gas_growth_rate_percent: 1,
            replacement_interval_ms: 1,
            max_waiting_time_ms: 1,
            confirmation_poll_interval_ms: 1,
        }
    }
}
