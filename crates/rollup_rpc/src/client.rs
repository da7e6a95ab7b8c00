//! Typed handles onto the three external systems the client talks to: the
//! L1 node, the L2 execution engine's plain JSON-RPC surface, and the
//! protocol contracts deployed on L1. `RpcClient` bundles all three plus
//! the engine-API and L1Origin-store handles behind one `Arc`-friendly
//! struct, the way the teacher's `BitcoinClient` bundles `bitcoincore_rpc`
//! handles for its several wallets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types::Header;
use alloy_sol_types::SolCall;
use alloy_transport::BoxTransport;
use rollup_config::ClientConfig;
use rollup_types::ProtocolState;

use crate::engine::EngineApiClient;
use crate::error::RpcError;
use crate::l1_origin_store::L1OriginStore;
use crate::wire_calls;

/// Default per-call RPC timeout, mirroring the Go client's `defaultTimeout`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Handle onto the L1 node: plain JSON-RPC only, no engine API.
#[derive(Clone)]
pub struct L1Client {
    provider: RootProvider<BoxTransport>,
}

impl L1Client {
    pub async fn connect(url: &str) -> Result<Self, RpcError> {
        let provider = ProviderBuilder::new()
            .on_builtin(url)
            .await
            .map_err(|e| RpcError::L1Transport(e.to_string()))?;
        Ok(Self { provider })
    }

    pub async fn header_by_number(&self, number: Option<u64>) -> Result<Header, RpcError> {
        let block = match number {
            Some(n) => self.provider.get_block_by_number(n.into(), false).await,
            None => self.provider.get_block_by_number(Default::default(), false).await,
        }
        .map_err(|e| RpcError::L1Transport(e.to_string()))?
        .ok_or(RpcError::NotFound("L1 header"))?;
        Ok(block.header)
    }

    pub async fn header_by_hash(&self, hash: B256) -> Result<Header, RpcError> {
        let block = self
            .provider
            .get_block_by_hash(hash, false)
            .await
            .map_err(|e| RpcError::L1Transport(e.to_string()))?
            .ok_or(RpcError::NotFound("L1 header"))?;
        Ok(block.header)
    }

    pub async fn balance(&self, address: Address) -> Result<U256, RpcError> {
        self.provider.get_balance(address).await.map_err(|e| RpcError::L1Transport(e.to_string()))
    }

    pub fn provider(&self) -> &RootProvider<BoxTransport> {
        &self.provider
    }
}

/// Handle onto the L2 execution engine's plain JSON-RPC surface (txpool,
/// account state, block headers — everything but `engine_*`).
#[derive(Clone)]
pub struct L2Client {
    provider: RootProvider<BoxTransport>,
}

impl L2Client {
    pub async fn connect(url: &str) -> Result<Self, RpcError> {
        let provider = ProviderBuilder::new()
            .on_builtin(url)
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?;
        Ok(Self { provider })
    }

    pub async fn header_by_number(&self, number: Option<u64>) -> Result<Header, RpcError> {
        let block = match number {
            Some(n) => self.provider.get_block_by_number(n.into(), false).await,
            None => self.provider.get_block_by_number(Default::default(), false).await,
        }
        .map_err(|e| RpcError::L2Transport(e.to_string()))?
        .ok_or(RpcError::NotFound("L2 header"))?;
        Ok(block.header)
    }

    pub async fn header_by_hash(&self, hash: B256) -> Result<Header, RpcError> {
        let block = self
            .provider
            .get_block_by_hash(hash, false)
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?
            .ok_or(RpcError::NotFound("L2 header"))?;
        Ok(block.header)
    }

    pub async fn account_nonce(&self, account: Address) -> Result<u64, RpcError> {
        self.provider
            .get_transaction_count(account)
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))
    }

    /// The account's transaction count as of `block_number`, used to
    /// compute the golden-touch signer's anchor-tx nonce at the parent
    /// block rather than at the current head (§4.2 step 9).
    pub async fn account_nonce_at(&self, account: Address, block_number: u64) -> Result<u64, RpcError> {
        self.provider
            .get_transaction_count(account)
            .block_id(block_number.into())
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))
    }

    /// The raw EIP-2718-encoded bytes of the first transaction in block
    /// `block_number` — always the anchor transaction for any block this
    /// driver inserted (§4.2 invariant "Anchor is always txlist[0]").
    pub async fn first_transaction_raw(&self, block_number: u64) -> Result<Vec<u8>, RpcError> {
        let block = self
            .provider
            .get_block_by_number(block_number.into(), true)
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?
            .ok_or(RpcError::NotFound("L2 block"))?;
        let tx = block
            .transactions
            .as_transactions()
            .and_then(|txs| txs.first())
            .ok_or(RpcError::NotFound("anchor transaction"))?;
        Ok(tx.inner.clone().encoded_2718())
    }

    /// The account's storage trie root at `block_number`, via
    /// `eth_getProof` with no storage keys requested — used by a
    /// contesting prover to read the L2 signal service's signal root
    /// without needing a specific slot.
    pub async fn storage_root(&self, account: Address, block_number: u64) -> Result<B256, RpcError> {
        let proof = self
            .provider
            .get_proof(account, Vec::new())
            .block_id(block_number.into())
            .await
            .map_err(|e| RpcError::L2Transport(e.to_string()))?;
        Ok(proof.storage_hash)
    }

    pub fn provider(&self) -> &RootProvider<BoxTransport> {
        &self.provider
    }
}

/// Handle onto the protocol contracts: `TaikoL1`, `TaikoL2`, optionally
/// `GuardianProver`.
#[derive(Clone)]
pub struct ProtocolClient {
    l1: RootProvider<BoxTransport>,
    l2: RootProvider<BoxTransport>,
    pub taiko_l1: Address,
    pub taiko_l2: Address,
    pub assignment_hook: Address,
    pub guardian_prover: Option<Address>,
}

impl ProtocolClient {
    pub fn new(
        l1: RootProvider<BoxTransport>,
        l2: RootProvider<BoxTransport>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            l1,
            l2,
            taiko_l1: config.taiko_l1_address,
            taiko_l2: config.taiko_l2_address,
            assignment_hook: config.assignment_hook_address,
            guardian_prover: config.guardian_prover_address,
        }
    }

    pub async fn get_protocol_state(&self) -> Result<ProtocolState, RpcError> {
        let call = wire_calls::get_state_variables_call();
        let ret = self.eth_call_l1(self.taiko_l1, call).await?;
        wire_calls::decode_state_variables(&ret)
    }

    pub async fn get_tx_list_config(&self) -> Result<rollup_types::TxListConfig, RpcError> {
        let call = wire_calls::get_config_call();
        let ret = self.eth_call_l1(self.taiko_l1, call).await?;
        wire_calls::decode_config(&ret)
    }

    pub async fn get_basefee(&self, l1_height: u64, parent_gas_used: u32) -> Result<U256, RpcError> {
        let call = wire_calls::get_basefee_call(l1_height, parent_gas_used);
        let ret = self.eth_call_l2(self.taiko_l2, call).await?;
        wire_calls::decode_basefee(&ret)
    }

    /// Resolves the tier provider's address via `TaikoL1.resolve` and
    /// fetches its tier set. An empty tier set is a protocol
    /// misconfiguration, not a transient condition — surfaced distinctly
    /// ([`RpcError::EmptyTiersList`]) so callers don't retry it forever.
    pub async fn get_tiers(&self) -> Result<Vec<rollup_types::TierDescriptor>, RpcError> {
        let tier_provider = self.resolve("tier_router").await?;
        let call = wire_calls::get_tiers_call();
        let ret = self.eth_call_l1(tier_provider, call).await?;
        wire_calls::decode_tiers(&ret)
    }

    /// `TaikoL1.getBlock(blockId).blockHash`: the L2 block hash the
    /// protocol has recorded for `block_id`, used by the per-event reorg
    /// check to detect a mismatch between the protocol's view and the
    /// local L2 engine's recorded header.
    pub async fn get_verified_block_hash(&self, block_id: u64) -> Result<B256, RpcError> {
        let call = wire_calls::get_block_call(block_id);
        let ret = self.eth_call_l1(self.taiko_l1, call).await?;
        wire_calls::decode_block_hash(&ret)
    }

    async fn resolve(&self, name: &str) -> Result<Address, RpcError> {
        use rollup_types::wire::ITaikoL1;
        let mut padded = [0u8; 32];
        let bytes = name.as_bytes();
        padded[..bytes.len().min(32)].copy_from_slice(&bytes[..bytes.len().min(32)]);
        let call = ITaikoL1::resolveCall { name: padded.into(), allowZero: false }.abi_encode();
        let ret = self.eth_call_l1(self.taiko_l1, call).await?;
        ITaikoL1::resolveCall::abi_decode_returns(&ret, true)
            .map(|r| r.addr)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decode resolve: {e}")))
    }

    async fn eth_call_l1(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        eth_call(&self.l1, to, data).await.map_err(RpcError::ContractReverted)
    }

    async fn eth_call_l2(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        eth_call(&self.l2, to, data).await.map_err(RpcError::ContractReverted)
    }
}

async fn eth_call(
    provider: &RootProvider<BoxTransport>,
    to: Address,
    data: Vec<u8>,
) -> Result<Vec<u8>, String> {
    let tx = alloy_rpc_types::TransactionRequest::default().to(to).input(data.into());
    provider
        .call(&tx)
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| crate::custom_error::decode_contract_error(&e.to_string()))
}

/// All three connections plus the engine-API and L1Origin-store handles,
/// bundled for a single process. Constructed once at startup and shared
/// behind an `Arc` by every role (driver, proposer, prover).
#[derive(Clone)]
pub struct RpcClient {
    pub l1: L1Client,
    pub l2: L2Client,
    pub protocol: ProtocolClient,
    pub engine: Arc<EngineApiClient>,
    pub l1_origin: L1OriginStore,
}

impl RpcClient {
    pub async fn connect(config: &ClientConfig) -> Result<Self, RpcError> {
        let l1 = L1Client::connect(&config.l1_ws_url).await?;
        let l2 = L2Client::connect(&config.l2_ws_url).await?;
        let protocol =
            ProtocolClient::new(l1.provider().clone(), l2.provider().clone(), config);
        let engine = Arc::new(EngineApiClient::connect(
            &config.l2_engine_url,
            &config.jwt_secret_path,
        )?);
        let l1_origin = L1OriginStore::new(l2.clone());

        Ok(Self { l1, l2, protocol, engine, l1_origin })
    }

    /// Mirrors `ensureGenesisMatched`: the node's local L2 genesis header
    /// must match the hash recorded in the protocol's genesis
    /// `BlockVerified` event.
    pub async fn ensure_genesis_matched(&self, expected_genesis_hash: B256) -> Result<(), RpcError> {
        let node_genesis = self.l2.header_by_number(Some(0)).await?;
        if node_genesis.hash != expected_genesis_hash {
            return Err(RpcError::Other(anyhow::anyhow!(
                "genesis header hash mismatch, node: {}, protocol: {}",
                node_genesis.hash,
                expected_genesis_hash
            )));
        }
        Ok(())
    }

    /// Polls `L2ExecutionEngineSyncProgress`-equivalent state until the
    /// engine's highest known block id is caught up, with exponential
    /// backoff, mirroring `WaitTillL2ExecutionEngineSynced`.
    pub async fn wait_l2_synced(&self) -> Result<(), RpcError> {
        use backon::{ExponentialBuilder, Retryable};

        let start = Instant::now();
        (|| async {
            let current = self.l2.header_by_number(None).await?.number;
            let state = self.protocol.get_protocol_state().await?;
            let highest = state.highest_block_id();
            if current < highest {
                tracing::info!(current, highest, elapsed = ?start.elapsed(), "L2 execution engine is syncing");
                return Err(RpcError::Syncing { current, highest });
            }
            Ok(())
        })
        .retry(ExponentialBuilder::default())
        .await
    }

    /// Mirrors `LatestL2KnownL1Header`: the L1 header referenced by the L2
    /// engine's head `L1Origin`, falling back to the protocol's genesis L1
    /// header when no origin is recorded yet or the referenced hash is
    /// gone from L1.
    pub async fn latest_l2_known_l1_header(&self) -> Result<Header, RpcError> {
        let head_origin = match self.l1_origin.head().await {
            Ok(origin) => origin,
            Err(RpcError::NotFound(_)) => return self.genesis_l1_header().await,
            Err(e) => return Err(e),
        };

        match self.l1.header_by_hash(head_origin.l1_block_hash).await {
            Ok(header) => Ok(header),
            Err(RpcError::NotFound(_)) => {
                tracing::warn!(hash = %head_origin.l1_block_hash, "latest known L1 header not found, using genesis");
                self.genesis_l1_header().await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn genesis_l1_header(&self) -> Result<Header, RpcError> {
        let state = self.protocol.get_protocol_state().await?;
        self.l1.header_by_number(Some(state.genesis_height)).await
    }

    /// Mirrors `L2ParentByBlockID`: the L2 header with the largest block
    /// id strictly smaller than `block_id`.
    pub async fn l2_parent_by_block_id(&self, block_id: u64) -> Result<Header, RpcError> {
        let parent_id = block_id.saturating_sub(1);
        if parent_id == 0 {
            return self.l2.header_by_number(Some(0)).await;
        }

        let origin = self.l1_origin.by_id(parent_id).await?;
        self.l2.header_by_hash(origin.l2_block_hash).await
    }

    /// Mirrors `GetPoolContent`: fetches candidate tx lists from the L2
    /// engine's mempool, pre-split and bounded by the given block limits.
    pub async fn get_pool_content(
        &self,
        beneficiary: Address,
        block_max_gas_limit: u64,
        max_bytes_per_tx_list: u64,
        locals: &[Address],
        max_transactions_lists: u64,
    ) -> Result<Vec<crate::pool::PreBuiltTxList>, RpcError> {
        crate::pool::get_pool_content(
            &self.protocol,
            &self.l1,
            &self.l2,
            beneficiary,
            block_max_gas_limit,
            max_bytes_per_tx_list,
            locals,
            max_transactions_lists,
        )
        .await
    }

    /// Mirrors `WaitL1Origin`: polls the engine for an `L1Origin` at
    /// `block_id` until present or `deadline` elapses.
    pub async fn wait_l1_origin(
        &self,
        block_id: u64,
        deadline: Duration,
    ) -> Result<rollup_types::L1Origin, RpcError> {
        let mut interval = tokio::time::interval(super::reorg::WAIT_L1_ORIGIN_POLL_INTERVAL);
        let start = Instant::now();

        loop {
            interval.tick().await;
            if start.elapsed() > deadline {
                return Err(RpcError::Timeout("L1Origin"));
            }
            match self.l1_origin.by_id(block_id).await {
                Ok(origin) => return Ok(origin),
                Err(RpcError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
