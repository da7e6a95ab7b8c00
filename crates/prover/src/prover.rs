//! The prover's event loop (4.5): on each tick, scans the four protocol
//! event kinds over the unprocessed L1 range and reacts to each, mirroring
//! the polling shape `driver::sync::Driver` and `proposer::propose::Proposer`
//! already use instead of literal per-event timer tasks or subscriptions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use capacity_manager::CapacityManager;
use dashmap::DashMap;
use rollup_config::{ClientConfig, ProverConfig, ProverMode, TxSenderConfig};
use rollup_rpc::RpcClient;
use rollup_types::{BlockProposedEvent, BlockVerifiedEvent, TierDescriptor, TransitionContestedEvent, TransitionProvedEvent};
use state_tracker::{HeadInfo, StateTracker};
use tokio::sync::watch;
use tx_sender::TxSender;

use crate::contest::derive_local_transition;
use crate::error::ProverError;
use crate::producer::{CancelToken, GuardianProducer, OptimisticProducer, ProofProducer, ProofRequest, RaikoProducer};
use crate::submission::{build_target, reverify_not_reorged, submit};
use crate::tier::{self, Decision};
use crate::{events, heartbeat};

const GAS_LIMIT_PROVE: u64 = 1_000_000;

struct InFlight {
    cancel: CancelToken,
    tier: u16,
}

pub struct Prover {
    rpc: Arc<RpcClient>,
    config: Arc<ClientConfig>,
    prover_config: Arc<ProverConfig>,
    tracker: StateTracker,
    tx_sender: TxSender,
    address: Address,
    capacity: Arc<CapacityManager>,
    tiers: std::sync::RwLock<Vec<TierDescriptor>>,
    in_flight: DashMap<u64, InFlight>,
    /// Metadata of every proposal seen this process's lifetime, kept around
    /// so a later escalation (triggered by `TransitionProved`/
    /// `TransitionContested`, which carry no metadata of their own) can
    /// still build a `ProveBlockInput` without re-deriving it from L1.
    metas: DashMap<u64, rollup_types::BlockMetadata>,
    /// Proposals parked by `try_accept_proposal` because the assignment
    /// window hasn't expired yet or capacity was momentarily exhausted;
    /// re-evaluated on every tick until accepted or genuinely skippable
    /// (4.5 "window-expired timer" / "forced-poll" retry).
    pending_proposals: DashMap<u64, BlockProposedEvent>,
    /// Escalation requests parked by `try_escalate` for the same reasons.
    pending_escalations: DashMap<u64, u16>,
    last_processed_l1: AtomicU64,
    last_verified_block_id: AtomicU64,
}

impl Prover {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: Arc<ClientConfig>,
        prover_config: Arc<ProverConfig>,
        tracker: StateTracker,
        tx_sender_config: TxSenderConfig,
    ) -> anyhow::Result<Self> {
        let private_key = hex::decode(config.private_key.trim_start_matches("0x"))?;
        let signer = PrivateKeySigner::from_slice(&private_key)?;
        let address = signer.address();
        let (tx_sender, _handle) = TxSender::spawn(signer, rpc.l1.clone(), config.l1_chain_id, tx_sender_config);

        let capacity = Arc::new(CapacityManager::new(prover_config.max_concurrent_proofs, prover_config.temp_capacity_expires()));

        Ok(Self {
            rpc,
            config,
            prover_config,
            tracker,
            tx_sender,
            address,
            capacity,
            tiers: std::sync::RwLock::new(Vec::new()),
            in_flight: DashMap::new(),
            metas: DashMap::new(),
            pending_proposals: DashMap::new(),
            pending_escalations: DashMap::new(),
            last_processed_l1: AtomicU64::new(0),
            last_verified_block_id: AtomicU64::new(0),
        })
    }

    /// The capacity manager backing this prover's admission control,
    /// shared with the HTTP assignment server so a bid it accepts and the
    /// proof work it later admits draw from the same ceiling.
    pub fn capacity(&self) -> Arc<CapacityManager> {
        self.capacity.clone()
    }

    /// Runs the poll loop until `stop_receiver` fires; also spawns the
    /// guardian heartbeat loop when configured as a guardian.
    pub async fn run(self: Arc<Self>, mut stop_receiver: watch::Receiver<bool>) {
        if self.prover_config.mode == ProverMode::Guardian {
            if let Some(endpoint) = self.prover_config.guardian_health_endpoint.clone() {
                tokio::spawn(heartbeat::run(
                    endpoint,
                    self.prover_config.guardian_heartbeat_interval(),
                    self.tracker.clone(),
                    stop_receiver.clone(),
                ));
            }
        }

        let mut timer = tokio::time::interval(self.prover_config.capacity_retry_interval());

        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => {}
                _ = stop_receiver.changed() => break,
            }

            self.capacity.clear_expired_temp();

            if let Err(err) = self.poll_once().await {
                tracing::warn!(%err, "prover poll failed, retrying next tick");
            }
        }

        tracing::info!("stop signal received, prover shutting down");
    }

    async fn tiers(&self) -> Result<Vec<TierDescriptor>, ProverError> {
        let cached = self.tiers.read().unwrap().clone();
        if !cached.is_empty() {
            return Ok(cached);
        }
        let fetched = self.rpc.protocol.get_tiers().await?;
        *self.tiers.write().unwrap() = fetched.clone();
        Ok(fetched)
    }

    async fn poll_once(&self) -> Result<(), ProverError> {
        let l1_head = self.rpc.l1.header_by_number(None).await?;
        self.tracker.set_l1_head(HeadInfo { number: l1_head.number, hash: l1_head.hash });

        let from = self.last_processed_l1.load(Ordering::SeqCst) + 1;
        let to = l1_head.number;

        if from <= to {
            let taiko_l1 = self.config.taiko_l1_address;
            let proposed = events::fetch_block_proposed(&self.rpc.l1, taiko_l1, from, to).await?;
            let proved = events::fetch_transition_proved(&self.rpc.l1, taiko_l1, from, to).await?;
            let contested = events::fetch_transition_contested(&self.rpc.l1, taiko_l1, from, to).await?;
            let verified = events::fetch_block_verified(&self.rpc.l1, taiko_l1, from, to).await?;

            for event in proposed {
                self.on_block_proposed(&event).await;
            }
            for event in proved {
                self.on_transition_proved(&event).await;
            }
            for event in contested {
                self.on_transition_contested(&event).await;
            }
            for event in verified {
                self.on_block_verified(&event);
            }

            self.last_processed_l1.store(to, Ordering::SeqCst);
        }

        self.retry_pending().await;
        Ok(())
    }

    /// Re-evaluates every parked proposal/escalation (4.5 "window-expired
    /// timer" / "forced-poll" retry). Runs every tick regardless of whether
    /// this tick scanned any new L1 blocks, since a `WaitForExpiry` window
    /// can expire, or capacity can free up, with no new event in sight.
    async fn retry_pending(&self) {
        let proposals: Vec<BlockProposedEvent> =
            self.pending_proposals.iter().map(|e| e.value().clone()).collect();
        for event in proposals {
            self.try_accept_proposal(event).await;
        }

        let escalations: Vec<(u64, u16)> =
            self.pending_escalations.iter().map(|e| (*e.key(), *e.value())).collect();
        for (block_id, current_tier) in escalations {
            self.try_escalate(block_id, current_tier).await;
        }
    }

    async fn on_block_proposed(&self, event: &BlockProposedEvent) {
        self.metas.insert(event.block_id, event.meta.clone());
        self.try_accept_proposal(event.clone()).await;
    }

    /// Attempts to accept and dispatch `event`. If the window hasn't
    /// expired yet or capacity is momentarily exhausted, parks it in
    /// `pending_proposals` for `retry_pending` to pick back up; otherwise
    /// removes any stale pending entry for this block.
    async fn try_accept_proposal(&self, event: BlockProposedEvent) {
        if self.in_flight.contains_key(&event.block_id) {
            self.pending_proposals.remove(&event.block_id);
            return;
        }
        if event.block_id <= self.last_verified_block_id.load(Ordering::SeqCst) {
            self.pending_proposals.remove(&event.block_id);
            return;
        }

        let tiers = match self.tiers().await {
            Ok(tiers) => tiers,
            Err(err) => {
                tracing::warn!(%err, block_id = event.block_id, "could not fetch tier set, will retry proposal next tick");
                self.pending_proposals.insert(event.block_id, event);
                return;
            }
        };
        let Some(min_tier) = tiers.iter().find(|t| t.id == event.meta.min_tier).copied() else {
            tracing::warn!(block_id = event.block_id, min_tier = event.meta.min_tier, "unknown tier id in BlockProposed, skipping");
            self.pending_proposals.remove(&event.block_id);
            return;
        };

        let decision = tier::decide(
            self.address,
            event.assigned_prover,
            &min_tier,
            event.meta.timestamp,
            self.prover_config.prove_unassigned_blocks,
        );

        let accepted_tier = match decision {
            Decision::Accept { tier } => tier,
            Decision::Skip => {
                self.pending_proposals.remove(&event.block_id);
                return;
            }
            Decision::WaitForExpiry { .. } => {
                self.pending_proposals.insert(event.block_id, event);
                return;
            }
        };

        let (_, granted) = self.capacity.take(event.block_id);
        if !granted {
            tracing::info!(block_id = event.block_id, "capacity exhausted, will retry proposal on a later tick");
            self.pending_proposals.insert(event.block_id, event);
            return;
        }

        self.pending_proposals.remove(&event.block_id);
        self.dispatch(event.block_id, accepted_tier, event.meta.clone(), event.meta.l1_height, event.meta.l1_hash, false);
    }

    async fn on_transition_proved(&self, event: &TransitionProvedEvent) {
        if let Some((_, in_flight)) = self.in_flight.remove(&event.block_id) {
            if in_flight.tier == event.tier {
                in_flight.cancel.cancel();
                self.capacity.release(event.block_id);
            } else {
                self.in_flight.insert(event.block_id, in_flight);
            }
        }

        if self.prover_config.mode != ProverMode::Contester {
            return;
        }

        let local = match derive_local_transition(&self.rpc, self.config.signal_service_address, event.block_id).await {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(%err, block_id = event.block_id, "could not derive local transition for contest check");
                return;
            }
        };

        if local.matches_derived(&event.transition) {
            return;
        }

        tracing::warn!(block_id = event.block_id, "TransitionProved disagrees with local derivation, contesting");
        self.request_escalated_proof(event.block_id, event.tier).await;
    }

    async fn on_transition_contested(&self, event: &TransitionContestedEvent) {
        if self.prover_config.mode != ProverMode::Contester {
            return;
        }
        self.request_escalated_proof(event.block_id, event.tier).await;
    }

    async fn request_escalated_proof(&self, block_id: u64, current_tier: u16) {
        self.try_escalate(block_id, current_tier).await;
    }

    /// Attempts to dispatch an escalated (next-tier) proof for `block_id`.
    /// Capacity exhaustion or a missing tier set parks the request in
    /// `pending_escalations` for `retry_pending` to retry every tick,
    /// rather than dropping it permanently.
    async fn try_escalate(&self, block_id: u64, current_tier: u16) {
        let tiers = match self.tiers().await {
            Ok(tiers) => tiers,
            Err(err) => {
                tracing::warn!(%err, block_id, "could not fetch tier set for escalation, will retry next tick");
                self.pending_escalations.insert(block_id, current_tier);
                return;
            }
        };

        let next = if self.prover_config.mode == ProverMode::Guardian {
            tiers.iter().max_by_key(|t| t.id).copied()
        } else {
            tier::next_tier(&tiers, current_tier)
        };
        let Some(next) = next else {
            tracing::warn!(block_id, "no higher tier available to escalate to");
            self.pending_escalations.remove(&block_id);
            return;
        };

        let Some(meta) = self.metas.get(&block_id).map(|m| m.clone()) else {
            tracing::warn!(block_id, "no recorded metadata for escalation, dropping");
            self.pending_escalations.remove(&block_id);
            return;
        };

        if self.in_flight.contains_key(&block_id) {
            tracing::info!(block_id, "escalation skipped, a proof is already in flight for this block");
            self.pending_escalations.remove(&block_id);
            return;
        }

        let (_, granted) = self.capacity.take(block_id);
        if !granted {
            tracing::info!(block_id, "capacity exhausted, will retry escalation on a later tick");
            self.pending_escalations.insert(block_id, current_tier);
            return;
        }

        self.pending_escalations.remove(&block_id);
        let is_guardian = self.prover_config.mode == ProverMode::Guardian;
        self.dispatch(block_id, next.id, meta.clone(), meta.l1_height, meta.l1_hash, is_guardian);
    }

    fn on_block_verified(&self, event: &BlockVerifiedEvent) {
        self.last_verified_block_id.store(event.block_id, Ordering::SeqCst);
        self.tracker.set_last_verified_block(rollup_types::L1Origin {
            block_id: event.block_id,
            l2_block_hash: event.block_hash,
            l1_block_height: 0,
            l1_block_hash: Default::default(),
            throwaway: false,
        });

        let stale: Vec<u64> = self.in_flight.iter().map(|e| *e.key()).filter(|&id| id <= event.block_id).collect();
        for block_id in stale {
            if let Some((_, in_flight)) = self.in_flight.remove(&block_id) {
                in_flight.cancel.cancel();
                self.capacity.release(block_id);
            }
        }

        let stale_proposals: Vec<u64> =
            self.pending_proposals.iter().map(|e| *e.key()).filter(|&id| id <= event.block_id).collect();
        for block_id in stale_proposals {
            self.pending_proposals.remove(&block_id);
        }

        let stale_escalations: Vec<u64> =
            self.pending_escalations.iter().map(|e| *e.key()).filter(|&id| id <= event.block_id).collect();
        for block_id in stale_escalations {
            self.pending_escalations.remove(&block_id);
        }
    }

    fn dispatch(
        &self,
        block_id: u64,
        tier_id: u16,
        meta: rollup_types::BlockMetadata,
        l1_height: u64,
        l1_block_hash: alloy_primitives::B256,
        is_guardian_approval: bool,
    ) {
        let cancel = CancelToken::new();
        self.in_flight.insert(block_id, InFlight { cancel: cancel.clone(), tier: tier_id });

        let rpc = self.rpc.clone();
        let config = self.config.clone();
        let prover_config = self.prover_config.clone();
        let tx_sender = self.tx_sender.clone();
        let address = self.address;
        let capacity = self.capacity.clone();

        tokio::spawn(async move {
            let result = prove_and_submit(
                &rpc,
                &config,
                &prover_config,
                &tx_sender,
                address,
                block_id,
                tier_id,
                meta,
                l1_height,
                l1_block_hash,
                is_guardian_approval,
                cancel,
            )
            .await;

            if let Err(err) = result {
                tracing::warn!(%err, block_id, "proof submission failed");
            }
            capacity.release(block_id);
        });
    }
}

#[allow(clippy::too_many_arguments)]
async fn prove_and_submit(
    rpc: &RpcClient,
    config: &ClientConfig,
    prover_config: &ProverConfig,
    tx_sender: &TxSender,
    address: Address,
    block_id: u64,
    tier_id: u16,
    meta: rollup_types::BlockMetadata,
    l1_height: u64,
    l1_block_hash: alloy_primitives::B256,
    is_guardian_approval: bool,
    cancel: CancelToken,
) -> Result<(), ProverError> {
    let request = ProofRequest {
        block_id,
        tier: tier_id,
        meta: meta.clone(),
        prover_address: address,
        l1_ws_url: config.l1_ws_url.clone(),
        l2_ws_url: config.l2_ws_url.clone(),
        l1_beacon_url: config.l1_beacon_url.clone(),
        graffiti: Default::default(),
    };

    let producer: Box<dyn ProofProducer> = if is_guardian_approval || prover_config.mode == ProverMode::Guardian {
        Box::new(GuardianProducer)
    } else if let Some(host) = prover_config.raiko_host.clone() {
        Box::new(RaikoProducer::new(host, prover_config.raiko_poll_interval()))
    } else {
        Box::new(OptimisticProducer)
    };

    let proof = producer.produce(&request, cancel.clone()).await?;
    if cancel.is_cancelled() {
        return Err(ProverError::Producer("cancelled before submission".to_string()));
    }

    reverify_not_reorged(rpc, l1_height, l1_block_hash).await?;

    let parent = rpc.l2_parent_by_block_id(block_id).await?;
    let block = rpc.l2.header_by_number(Some(block_id)).await?;
    let transition = rollup_types::Transition {
        parent_hash: parent.hash,
        block_hash: block.hash,
        state_root: block.state_root,
        graffiti: Default::default(),
    };

    let target = build_target(
        config.taiko_l1_address,
        config.guardian_prover_address,
        is_guardian_approval || prover_config.mode == ProverMode::Guardian,
        block_id,
        &meta,
        &transition,
        &proof,
    )?;

    submit(tx_sender, target, GAS_LIMIT_PROVE).await
}
