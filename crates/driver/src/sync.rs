//! The chain syncer's main loop: advances L2 to mirror every `BlockProposed`
//! event observed on L1, detecting and recovering from L1 reorgs along the
//! way (§4.2).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256};
use alloy_rpc_types::Withdrawal;
use rollup_config::{ClientConfig, DriverConfig};
use rollup_rpc::reorg::check_l1_reorg;
use rollup_rpc::RpcClient;
use rollup_types::{BlockProposedEvent, L1Origin};
use state_tracker::{HeadInfo, StateTracker};

use crate::anchor::{AnchorInput, AnchorSigner, L2AnchorReader};
use crate::engine_drive::{drive_block_insertion, BlockInsertionPlan};
use crate::error::DriverError;
use crate::{events, txlist};

/// Drives L2 block insertion from `BlockProposed` events observed on L1.
/// One `Driver` is shared (behind an `Arc`) between the main syncing loop
/// and anything that needs read access to its progress, mirroring how
/// `StateTracker` is shared across roles.
pub struct Driver {
    rpc: Arc<RpcClient>,
    config: Arc<ClientConfig>,
    driver_config: Arc<DriverConfig>,
    tracker: StateTracker,
    anchor: AnchorSigner,
    anchor_reader: L2AnchorReader,
    last_inserted_id: AtomicU64,
    out_of_sync: std::sync::atomic::AtomicBool,
    /// Set once `trigger_beacon_sync` has returned `Ok`, cleared once the
    /// engine's head catches up to the beacon-synced target and `l1_current`
    /// has been reset from its `L1Origin` (§4.2 "P2P sync just finished").
    beacon_sync_triggered: std::sync::atomic::AtomicBool,
}

impl Driver {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: Arc<ClientConfig>,
        driver_config: Arc<DriverConfig>,
        tracker: StateTracker,
    ) -> anyhow::Result<Self> {
        let anchor = AnchorSigner::new(
            &driver_config.golden_touch_private_key,
            config.taiko_l2_address,
            config.l2_chain_id,
            driver_config.anchor_gas_limit,
        )?;
        let anchor_reader = L2AnchorReader::new(rpc.l2.clone());

        Ok(Self {
            rpc,
            config,
            driver_config,
            tracker,
            anchor,
            anchor_reader,
            last_inserted_id: AtomicU64::new(0),
            out_of_sync: std::sync::atomic::AtomicBool::new(false),
            beacon_sync_triggered: std::sync::atomic::AtomicBool::new(false),
        })
    }

    pub fn last_inserted_id(&self) -> u64 {
        self.last_inserted_id.load(Ordering::SeqCst)
    }

    /// Runs `process_l1_blocks` on `driver_config.poll_interval()` until
    /// `stop_receiver` fires, the way every long-running role in this
    /// workspace loops (cf. `state_tracker::spawn_refresh`).
    pub async fn run(self: Arc<Self>, mut stop_receiver: tokio::sync::watch::Receiver<bool>) {
        let mut timer = tokio::time::interval(self.driver_config.poll_interval());

        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => {}
                _ = stop_receiver.changed() => break,
            }

            if let Err(err) = self.process_l1_blocks().await {
                tracing::warn!(%err, "process_l1_blocks failed, will retry next tick");
            }
        }

        tracing::info!("stop signal received, driver shutting down");
    }

    /// §4.2 "Main loop per invocation". Re-entrant and idempotent: safe to
    /// call repeatedly, including concurrently with itself finishing a
    /// prior call's reorg restart.
    pub async fn process_l1_blocks(&self) -> Result<(), DriverError> {
        loop {
            let l1_head = self.rpc.l1.header_by_number(None).await?;
            self.tracker.set_l1_head(HeadInfo { number: l1_head.number, hash: l1_head.hash });

            if self.driver_config.p2p_sync_verified_blocks {
                let last_verified = self.rpc.protocol.get_protocol_state().await?.last_verified_block_id;
                let l2_head = self.rpc.l2.header_by_number(None).await?;

                if self.beacon_sync_triggered.load(Ordering::SeqCst) {
                    if l2_head.number < last_verified {
                        // Still catching up; nothing to derive yet this tick.
                        return Ok(());
                    }
                    self.reset_after_beacon_sync().await?;
                } else if last_verified > 0 && l2_head.number < last_verified && !self.out_of_sync.load(Ordering::SeqCst) {
                    match self.trigger_beacon_sync(last_verified).await {
                        Ok(()) => {
                            self.beacon_sync_triggered.store(true, Ordering::SeqCst);
                            return Ok(());
                        }
                        Err(DriverError::Rpc(rollup_rpc::RpcError::Timeout(_))) => {
                            tracing::warn!("beacon sync timed out, falling back to calldata derivation");
                            self.out_of_sync.store(true, Ordering::SeqCst);
                        }
                        Err(err) => return Err(err),
                    }
                }
            }

            let l1_current = self.resolve_l1_current(&l1_head).await?;

            let reorged = self.iterate_events(l1_current, l1_head.number).await?;
            if reorged {
                continue;
            }
            return Ok(());
        }
    }

    /// §4.2 step 3 "P2P sync just finished": the engine's head has caught up
    /// to the beacon-synced target, so calldata derivation can resume from
    /// the head's own `L1Origin` rather than re-walking blocks the engine
    /// already has.
    async fn reset_after_beacon_sync(&self) -> Result<(), DriverError> {
        let head_origin = self.rpc.l1_origin.head().await?;
        let l1_current_header = self.rpc.l1.header_by_number(Some(head_origin.l1_block_height)).await?;

        self.tracker.set_l1_current(HeadInfo { number: l1_current_header.number, hash: l1_current_header.hash });
        self.last_inserted_id.store(head_origin.block_id, Ordering::SeqCst);
        self.beacon_sync_triggered.store(false, Ordering::SeqCst);

        tracing::info!(
            resume_from = head_origin.block_id,
            l1_height = l1_current_header.number,
            "P2P sync finished, resuming calldata derivation from the synced L2 head's L1Origin"
        );
        Ok(())
    }

    /// §4.2 step 3: after a just-finished P2P sync, or on first run, L1
    /// current is taken from the snapshot tracker when set, otherwise from
    /// the engine's recorded head `L1Origin`.
    async fn resolve_l1_current(
        &self,
        l1_head: &alloy_rpc_types::Header,
    ) -> Result<alloy_rpc_types::Header, DriverError> {
        let _ = l1_head;
        let current = self.tracker.l1_current();
        if current.number != 0 || current.hash != B256::ZERO {
            return Ok(self.rpc.l1.header_by_number(Some(current.number)).await?);
        }
        Ok(self.rpc.latest_l2_known_l1_header().await?)
    }

    /// §4.2 "Event iteration". Returns `Ok(true)` if a reorg was detected
    /// and the outer loop should restart.
    async fn iterate_events(
        &self,
        l1_current: alloy_rpc_types::Header,
        l1_head_number: u64,
    ) -> Result<bool, DriverError> {
        let to_block = l1_head_number
            .min(l1_current.number + self.driver_config.max_l1_blocks_per_iteration);

        let events =
            events::fetch_block_proposed(&self.rpc.l1, self.config.taiko_l1_address, l1_current.number, to_block)
                .await?;

        for event in events {
            if let Some(reset) = self.check_reorg_before_event(&event).await? {
                self.tracker.set_l1_current(HeadInfo {
                    number: reset.l1_current_to_reset.number,
                    hash: reset.l1_current_to_reset.hash,
                });
                self.last_inserted_id.store(reset.last_handled_block_id_to_reset, Ordering::SeqCst);
                tracing::info!(
                    reset_to = reset.last_handled_block_id_to_reset,
                    "L1 reorg detected, restarting sync from reset point"
                );
                return Ok(true);
            }

            self.on_block_proposed(&event).await?;
        }

        let final_header = self.rpc.l1.header_by_number(Some(to_block)).await?;
        self.tracker.set_l1_current(HeadInfo { number: final_header.number, hash: final_header.hash });
        Ok(false)
    }

    async fn check_reorg_before_event(
        &self,
        event: &BlockProposedEvent,
    ) -> Result<Option<rollup_rpc::reorg::ReorgCheckResult>, DriverError> {
        let l2_head = self.rpc.l2.header_by_number(None).await?;
        if l2_head.number == 0 {
            return Ok(None);
        }

        if let Some(reset) = self.check_last_verified_block_mismatch(&l2_head).await? {
            return Ok(Some(reset));
        }

        let parent_id = event.block_id.saturating_sub(1);
        let result = check_l1_reorg(&self.rpc, &self.anchor_reader, parent_id).await?;
        if result.is_reorged {
            return Ok(Some(result));
        }
        Ok(None)
    }

    /// Mirrors `checkLastVerifiedBlockMismatch`: compares the protocol's
    /// recorded hash for its last verified block against this node's own L2
    /// header at that id. A mismatch means the two have diverged in a way
    /// the narrower anchor-snippet walk below can't detect, so sync resets
    /// straight to L1 genesis.
    async fn check_last_verified_block_mismatch(
        &self,
        l2_head: &alloy_rpc_types::Header,
    ) -> Result<Option<rollup_rpc::reorg::ReorgCheckResult>, DriverError> {
        let state = self.rpc.protocol.get_protocol_state().await?;
        if l2_head.number < state.last_verified_block_id {
            return Ok(None);
        }

        let protocol_hash = self.rpc.protocol.get_verified_block_hash(state.last_verified_block_id).await?;
        let local_header = self.rpc.l2.header_by_number(Some(state.last_verified_block_id)).await?;
        if protocol_hash == local_header.hash {
            return Ok(None);
        }

        tracing::warn!(
            last_verified_block_id = state.last_verified_block_id,
            "last verified block hash mismatch detected, resetting L2 chain sync to genesis"
        );
        let genesis_header = self.rpc.genesis_l1_header().await?;
        Ok(Some(rollup_rpc::reorg::ReorgCheckResult {
            is_reorged: true,
            l1_current_to_reset: genesis_header,
            last_handled_block_id_to_reset: 0,
        }))
    }

    /// §4.2 "Per-event insertion". Ignores events already applied or
    /// referring to genesis; any other failure is returned without
    /// advancing `last_inserted_id`.
    pub async fn on_block_proposed(&self, event: &BlockProposedEvent) -> Result<(), DriverError> {
        if event.block_id == 0 || event.block_id <= self.last_inserted_id() {
            return Ok(());
        }

        let parent = self.rpc.l2_parent_by_block_id(event.block_id).await?;

        let raw_tx_list = self.fetch_raw_tx_list(event).await?;
        let tx_list_config = self.rpc.protocol.get_tx_list_config().await?;
        let tx_list = txlist::decode_and_validate(&raw_tx_list, tx_list_config.block_max_tx_list_bytes);

        wait_until(event.meta.timestamp).await;

        let basefee = self
            .rpc
            .protocol
            .get_basefee(event.meta.l1_height, parent.gas_used as u32)
            .await?;

        let withdrawals: Vec<Withdrawal> = event
            .deposits_processed
            .iter()
            .enumerate()
            .map(|(index, d)| Withdrawal {
                index: index as u64,
                validator_index: d.id,
                address: d.recipient,
                amount: (d.amount / 1_000_000_000) as u64,
            })
            .collect();

        let anchor_nonce = self.rpc.l2.account_nonce_at(self.anchor.address(), parent.number).await?;
        let anchor_input = AnchorInput {
            l1_block_hash: event.meta.l1_hash,
            l1_state_root: parent_state_root(&parent),
            l1_height: event.meta.l1_height,
            parent_gas_used: parent.gas_used,
        };
        let anchor_tx = self
            .anchor
            .sign(anchor_input, anchor_nonce, basefee.try_into().unwrap_or(u128::MAX))
            .map_err(DriverError::Other)?;

        let combined = prepend_anchor(&anchor_tx, &tx_list);

        let protocol_state = self.rpc.protocol.get_protocol_state().await?;
        let l1_origin = L1Origin {
            block_id: event.block_id,
            l2_block_hash: B256::ZERO,
            l1_block_height: event.meta.l1_height,
            l1_block_hash: event.meta.l1_hash,
            throwaway: tx_list.is_empty() && !raw_tx_list.is_empty(),
        };

        let plan = BlockInsertionPlan {
            parent_hash: parent.hash,
            timestamp: event.meta.timestamp,
            random: event.meta.difficulty,
            suggested_fee_recipient: event.meta.coinbase,
            withdrawals,
            highest_block_id: protocol_state.highest_block_id(),
            beneficiary: event.meta.coinbase,
            gas_limit: event.meta.gas_limit as u64 + self.driver_config.anchor_gas_limit,
            tx_list: combined,
            mix_hash: event.meta.difficulty,
            extra_data: event.meta.extra_data,
            base_fee_per_gas: basefee,
            l1_origin,
        };

        drive_block_insertion(&self.rpc, plan, event.block_id).await?;

        self.last_inserted_id.store(event.block_id, Ordering::SeqCst);
        self.tracker.set_l1_current(HeadInfo {
            number: event.location.l1_block_number,
            hash: event.location.l1_block_hash,
        });
        Ok(())
    }

    async fn fetch_raw_tx_list(&self, event: &BlockProposedEvent) -> Result<Vec<u8>, DriverError> {
        if event.meta.blob_used {
            let beacon_url = self
                .config
                .l1_beacon_url
                .as_deref()
                .ok_or_else(|| DriverError::Other(anyhow::anyhow!("blob-carrying proposal but no beacon URL configured")))?;
            let blob_fetcher = rollup_rpc::blob::BlobFetcher::new(beacon_url.to_string());
            let l1_header = self.rpc.l1.header_by_number(Some(event.location.l1_block_number)).await?;
            let slot = l1_block_to_slot(
                l1_header.timestamp,
                self.driver_config.beacon_genesis_time,
                self.driver_config.beacon_seconds_per_slot,
            );

            let blob = match blob_fetcher.fetch_matching_blob(slot, event.meta.blob_hash).await {
                Ok(blob) => blob,
                Err(err) => {
                    tracing::warn!(%err, block_id = event.block_id, "blob fetch/verify failed, substituting empty tx list");
                    return Ok(Vec::new());
                }
            };

            let offset = event.meta.tx_list_byte_offset as usize;
            let size = event.meta.tx_list_byte_size as usize;
            if offset + size > blob.len() {
                tracing::warn!(block_id = event.block_id, "blob slice out of range, substituting empty tx list");
                return Ok(Vec::new());
            }
            Ok(blob[offset..offset + size].to_vec())
        } else {
            events::fetch_calldata_txlist(&self.rpc.l1, &event.location).await
        }
    }

    /// §4.2's `trigger_beacon_sync`: asks the engine to P2P-sync toward
    /// `target_id`'s L2 block hash.
    pub async fn trigger_beacon_sync(&self, target_id: u64) -> Result<(), DriverError> {
        let target_origin = self.rpc.wait_l1_origin(target_id, self.driver_config.wait_l1_origin_timeout()).await?;
        let state = alloy_rpc_types_engine::ForkchoiceState {
            head_block_hash: target_origin.l2_block_hash,
            safe_block_hash: target_origin.l2_block_hash,
            finalized_block_hash: target_origin.l2_block_hash,
        };
        self.rpc.engine.fork_choice_updated(state, None).await?;
        Ok(())
    }
}

fn parent_state_root(parent: &alloy_rpc_types::Header) -> B256 {
    parent.state_root
}

fn prepend_anchor(anchor_tx: &alloy_primitives::Bytes, rlp_tx_list: &[u8]) -> Vec<u8> {
    // The decoded tx list is itself an RLP list of raw transactions; push
    // the anchor in front and re-encode the combined list (§4.2 step 10,
    // invariant "Anchor is always txlist[0]").
    let mut txs: Vec<Vec<u8>> = if rlp_tx_list.is_empty() {
        Vec::new()
    } else {
        rlp::Rlp::new(rlp_tx_list).as_list::<Vec<u8>>().unwrap_or_default()
    };
    txs.insert(0, anchor_tx.to_vec());

    let mut stream = rlp::RlpStream::new_list(txs.len());
    for tx in &txs {
        stream.append(tx);
    }
    stream.out().to_vec()
}

async fn wait_until(block_timestamp: u64) {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    if block_timestamp > now {
        tokio::time::sleep(std::time::Duration::from_secs(block_timestamp - now)).await;
    }
}

fn l1_block_to_slot(timestamp: u64, genesis_time: u64, seconds_per_slot: u64) -> u64 {
    timestamp.saturating_sub(genesis_time) / seconds_per_slot.max(1)
}

/// Address `BlockProposed` events are emitted from, used by
/// [`events::fetch_block_proposed`]'s callers. Exposed for the `proposer`
/// crate, which reads the same event stream to confirm inclusion.
pub fn taiko_l1_address(config: &ClientConfig) -> Address {
    config.taiko_l1_address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_anchor_inserts_at_index_zero() {
        let mut stream = rlp::RlpStream::new_list(2);
        stream.append(&vec![9u8, 9, 9]);
        stream.append(&vec![8u8, 8, 8]);
        let tx_list = stream.out().to_vec();

        let anchor = alloy_primitives::Bytes::from(vec![1u8, 2, 3]);
        let combined = prepend_anchor(&anchor, &tx_list);

        let decoded: Vec<Vec<u8>> = rlp::Rlp::new(&combined).as_list().unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], vec![1, 2, 3]);
        assert_eq!(decoded[1], vec![9, 9, 9]);
    }

    #[test]
    fn prepend_anchor_handles_empty_list() {
        let anchor = alloy_primitives::Bytes::from(vec![1u8]);
        let combined = prepend_anchor(&anchor, &[]);
        let decoded: Vec<Vec<u8>> = rlp::Rlp::new(&combined).as_list().unwrap();
        assert_eq!(decoded, vec![vec![1u8]]);
    }

    #[test]
    fn l1_block_to_slot_divides_by_slot_duration() {
        assert_eq!(l1_block_to_slot(1_606_824_023 + 120, 1_606_824_023, 12), 10);
        assert_eq!(l1_block_to_slot(1_606_824_023, 1_606_824_023, 12), 0);
    }
}
