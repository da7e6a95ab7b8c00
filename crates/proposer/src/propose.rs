//! The proposer's epoch loop (§4.4): on each tick, pulls candidate tx
//! lists from the L2 mempool, bids them out to provers, and submits
//! whichever lists qualify as L1 `proposeBlock` transactions. Falls back
//! to a single empty-list proposal when nothing qualifies but the chain
//! has gone quiet for too long.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use rollup_config::{ClientConfig, ProposerConfig, TxSenderConfig};
use rollup_rpc::{PreBuiltTxList, RpcClient};
use rollup_types::{AssignmentPayload, TierFee};
use tokio::sync::watch;
use tx_sender::{TxSender, UnsignedTx};

use crate::assignment::{bid_for_assignment, expiry_from_now};
use crate::builder::{assignment_from_bid, build_propose_block_input, encode_propose_block_call};
use crate::error::ProposerError;

pub struct Proposer {
    rpc: Arc<RpcClient>,
    config: Arc<ClientConfig>,
    proposer_config: Arc<ProposerConfig>,
    tx_sender: TxSender,
    coinbase: Address,
    last_proposed_at: std::sync::Mutex<Instant>,
    last_meta_hash: AtomicU64Hash,
}

/// `AtomicU64` can't hold a `B256`; this is a tiny lock-guarded cache of
/// the last proposal's meta hash plus the block id it belongs to, read far
/// more often than written.
struct AtomicU64Hash(std::sync::RwLock<(u64, B256)>);

impl AtomicU64Hash {
    fn new() -> Self {
        Self(std::sync::RwLock::new((0, B256::ZERO)))
    }

    fn get(&self) -> (u64, B256) {
        *self.0.read().unwrap()
    }

    fn set(&self, block_id: u64, hash: B256) {
        *self.0.write().unwrap() = (block_id, hash);
    }
}

impl Proposer {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: Arc<ClientConfig>,
        proposer_config: Arc<ProposerConfig>,
        tx_sender_config: TxSenderConfig,
    ) -> anyhow::Result<Self> {
        let private_key = hex::decode(config.private_key.trim_start_matches("0x"))?;
        let signer = PrivateKeySigner::from_slice(&private_key)?;
        let coinbase = signer.address();
        let (tx_sender, _handle) =
            TxSender::spawn(signer, rpc.l1.clone(), config.l1_chain_id, tx_sender_config);

        Ok(Self {
            rpc,
            config,
            proposer_config,
            tx_sender,
            coinbase,
            last_proposed_at: std::sync::Mutex::new(Instant::now()),
            last_meta_hash: AtomicU64Hash::new(),
        })
    }

    pub async fn run(self: Arc<Self>, mut stop_receiver: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.proposer_config.propose_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.propose_op().await {
                        tracing::warn!(%err, "propose_op failed, retrying next tick");
                    }
                }
                _ = stop_receiver.changed() => {
                    tracing::info!("proposer received stop signal, shutting down");
                    return;
                }
            }
        }
    }

    /// Runs one proposal attempt; returns `Ok(())` whether zero or more
    /// lists were accepted (§4.4 "Contract").
    pub async fn propose_op(&self) -> Result<(), ProposerError> {
        let tx_list_config = self.rpc.protocol.get_tx_list_config().await?;
        let lists = self
            .rpc
            .get_pool_content(
                self.coinbase,
                tx_list_config.block_max_gas_limit,
                tx_list_config.block_max_tx_list_bytes,
                &[],
                self.proposer_config.max_proposed_tx_lists_per_epoch as u64,
            )
            .await?;

        let empty_epoch_allowed = self.last_proposed_at.lock().unwrap().elapsed()
            >= self.proposer_config.min_proposing_interval();

        let mut any_qualified = false;
        for list in lists {
            if !qualifies(&list, &self.proposer_config, empty_epoch_allowed) {
                continue;
            }
            any_qualified = true;
            if let Err(err) = self.propose_one_list(list).await {
                tracing::warn!(%err, "skipping tx list after per-list failure");
            }
        }

        if !any_qualified && empty_epoch_allowed {
            tracing::info!("no tx list qualified, proposing an empty block to keep the chain live");
            self.propose_one_list(PreBuiltTxList {
                tx_list_bytes: Bytes::new(),
                estimated_gas_used: 0,
                bytes_length: 0,
            })
            .await?;
        }

        Ok(())
    }

    async fn propose_one_list(&self, list: PreBuiltTxList) -> Result<(), ProposerError> {
        let compressed = compress(&list.tx_list_bytes);
        let tx_list_hash = B256::from_slice(&keccak_of(&compressed));

        let (parent_block_id, parent_meta_hash) = self.parent_meta_hash().await?;
        let l1_head = self.rpc.l1.header_by_number(None).await?;
        let max_block_id = l1_head.number + self.proposer_config.assignment_timeout().as_secs().max(1);

        let payload = AssignmentPayload {
            chain_id: self.config.l2_chain_id,
            taiko_l1: self.config.taiko_l1_address,
            assignment_hook: self.config.assignment_hook_address,
            meta_hash: tx_list_hash,
            parent_meta_hash,
            blob_hash: B256::ZERO,
            fee_token: Address::ZERO,
            expiry: expiry_from_now(Duration::from_secs(300)),
            max_block_id,
            max_proposed_in: parent_block_id + 1,
            tier_fees: default_tier_fees(),
        };

        let bid = bid_for_assignment(&self.proposer_config, &payload).await?;
        let assignment = assignment_from_bid(
            &bid,
            Address::ZERO,
            payload.expiry,
            bid.max_block_id,
            tx_list_hash,
            parent_meta_hash,
        );

        let input = build_propose_block_input(
            bid.prover,
            self.coinbase,
            B256::ZERO,
            B256::ZERO,
            0,
            compressed.len() as u32,
            parent_meta_hash,
            self.config.assignment_hook_address,
            &assignment,
            U256::ZERO,
            Bytes::from(compressed),
            false,
        );
        let calldata = encode_propose_block_call(input);

        let (_tx_id, confirm) = self
            .tx_sender
            .send_raw(self.config.taiko_l1_address, U256::ZERO, calldata, 2_000_000)
            .map_err(ProposerError::Send)?;

        let confirmation = confirm
            .await
            .map_err(|_| ProposerError::Other(anyhow::anyhow!("tx sender dropped confirmation channel")))?;

        match confirmation.outcome {
            tx_sender::Outcome::Success { .. } => {
                *self.last_proposed_at.lock().unwrap() = Instant::now();
                self.last_meta_hash.set(parent_block_id + 1, tx_list_hash);
                Ok(())
            }
            other => Err(ProposerError::NotMined(format!("{other:?}"))),
        }
    }

    /// The meta hash the next proposal's `parentMetaHash` must chain from:
    /// the in-memory cursor from this process's own last proposal, or, on
    /// a cold start, a lookup of the protocol's current highest block id.
    async fn parent_meta_hash(&self) -> Result<(u64, B256), ProposerError> {
        let (cached_id, cached_hash) = self.last_meta_hash.get();
        if cached_hash != B256::ZERO {
            return Ok((cached_id, cached_hash));
        }

        let state = self.rpc.protocol.get_protocol_state().await?;
        let highest = state.highest_block_id();
        if highest == 0 {
            return Ok((0, B256::ZERO));
        }

        let head = self.rpc.l1.header_by_number(None).await?.number;
        let from = head.saturating_sub(100_000);
        let hash = crate::events::meta_hash_for_block_id(
            &self.rpc.l1,
            self.config.taiko_l1_address,
            highest,
            from,
            head,
        )
        .await?
        .unwrap_or(B256::ZERO);
        Ok((highest, hash))
    }
}

fn qualifies(list: &PreBuiltTxList, config: &ProposerConfig, empty_epoch_allowed: bool) -> bool {
    if list.estimated_gas_used < config.min_gas_used || list.bytes_length < config.min_tx_list_bytes {
        return empty_epoch_allowed;
    }
    true
}

fn default_tier_fees() -> Vec<TierFee> {
    vec![TierFee { tier: 100, fee: 10_000_000_000_000 }]
}

fn compress(rlp_tx_list: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rlp_tx_list).expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("finishing an in-memory zlib stream cannot fail")
}

fn keccak_of(bytes: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    Keccak256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list(gas: u64, bytes: u64) -> PreBuiltTxList {
        PreBuiltTxList { tx_list_bytes: Bytes::new(), estimated_gas_used: gas, bytes_length: bytes }
    }

    #[test]
    fn qualifies_rejects_small_lists_outside_empty_epoch() {
        let config = rollup_config::ProposerConfig::for_tests();
        let list = sample_list(0, 0);
        assert!(!qualifies(&list, &config, false));
        assert!(qualifies(&list, &config, true));
    }

    #[test]
    fn qualifies_accepts_lists_meeting_minimums() {
        let mut config = rollup_config::ProposerConfig::for_tests();
        config.min_gas_used = 1_000;
        config.min_tx_list_bytes = 10;
        let list = sample_list(2_000, 20);
        assert!(qualifies(&list, &config, false));
    }
}
