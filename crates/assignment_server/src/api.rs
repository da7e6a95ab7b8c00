//! `/assignment` and `/status` handlers (§4.8): the prover-side HTTP
//! contract the proposer bids against. Rejection rules, bond check and
//! EIP-712-style signing all mirror `proposer::assignment`'s client side
//! of the same payload.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use capacity_manager::CapacityManager;
use rollup_config::{ClientConfig, ProverConfig};
use rollup_rpc::RpcClient;
use rollup_types::{AssignmentPayload, TierFee};
use serde::{Deserialize, Serialize};

use crate::error::AssignmentServerError;

pub struct AssignmentServerState {
    pub rpc: Arc<RpcClient>,
    pub config: Arc<ClientConfig>,
    pub prover_config: Arc<ProverConfig>,
    pub signer: PrivateKeySigner,
    pub capacity: Arc<CapacityManager>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub fee_token: Address,
    pub tier_fees: Vec<TierFeeWire>,
    pub expiry: u64,
    pub tx_list_hash: B256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeeWire {
    pub tier: u16,
    pub fee: u128,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub signed_payload: alloy_primitives::Bytes,
    pub prover: Address,
    pub max_block_id: u64,
    pub max_proposed_in: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeeConfig {
    pub tier: u16,
    pub min_fee: u128,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub prover: Address,
    pub tier_fees: Vec<TierFeeConfig>,
    pub max_expiry_secs: u64,
}

/// `GET /status`: per-tier minimum fees, max expiry and this prover's
/// address.
pub async fn status(
    state: axum::extract::State<Arc<AssignmentServerState>>,
) -> axum::Json<StatusResponse> {
    let tier_fees = state
        .prover_config
        .tier_min_fees
        .iter()
        .map(|(tier, min_fee)| TierFeeConfig { tier: *tier, min_fee: *min_fee })
        .collect();

    axum::Json(StatusResponse {
        prover: state.signer.address(),
        tier_fees,
        max_expiry_secs: state.prover_config.max_assignment_expiry_secs,
    })
}

/// `POST /assignment`: validates the bid, checks capacity and the
/// prover's on-chain liveness bond balance, then signs the commitment
/// payload (§4.8).
pub async fn assignment(
    state: axum::extract::State<Arc<AssignmentServerState>>,
    axum::Json(req): axum::Json<AssignmentRequest>,
) -> Result<axum::Json<AssignmentResponse>, AssignmentServerError> {
    if req.fee_token != Address::ZERO {
        return Err(AssignmentServerError::NonNativeFeeToken);
    }
    if req.tx_list_hash == B256::ZERO {
        return Err(AssignmentServerError::ZeroTxListHash);
    }

    let now = now_secs();
    let max_expiry = now + state.prover_config.max_assignment_expiry_secs;
    if req.expiry > max_expiry {
        return Err(AssignmentServerError::ExpiryTooFar { expiry: req.expiry, max: max_expiry });
    }

    for fee in &req.tier_fees {
        if let Some(&minimum) = state.prover_config.tier_min_fees.get(&fee.tier) {
            if fee.fee < minimum {
                return Err(AssignmentServerError::FeeBelowMinimum {
                    tier: fee.tier,
                    offered: fee.fee,
                    minimum,
                });
            }
        }
    }

    // Reserve a temp-capacity slot: the block id doesn't exist yet, so
    // this uses the additive temp-capacity lane (SPEC_FULL.md §C.3)
    // rather than the block-id-keyed `take`. There is no early release —
    // a reservation that doesn't convert to a real `take` once the block
    // is proposed simply expires (see `CapacityManager::clear_expired_temp`).
    if !state.capacity.take_temp().1 {
        return Err(AssignmentServerError::CapacityExhausted);
    }

    check_liveness_bond(&state).await?;

    let l1_head = state.rpc.l1.header_by_number(None).await.map_err(AssignmentServerError::Rpc)?;
    let max_block_id = l1_head.number + state.prover_config.max_slippage_blocks;
    let max_proposed_in = max_block_id;

    let payload = AssignmentPayload {
        chain_id: state.config.l1_chain_id,
        taiko_l1: state.config.taiko_l1_address,
        assignment_hook: state.config.assignment_hook_address,
        meta_hash: B256::ZERO,
        parent_meta_hash: B256::ZERO,
        blob_hash: req.tx_list_hash,
        fee_token: Address::ZERO,
        expiry: req.expiry,
        max_block_id,
        max_proposed_in,
        tier_fees: req.tier_fees.iter().map(|f| TierFee { tier: f.tier, fee: f.fee }).collect(),
    };

    let digest = payload.digest();
    let signature = state
        .signer
        .sign_hash(&digest)
        .await
        .map_err(|e| AssignmentServerError::Other(anyhow::anyhow!("signing assignment: {e}")))?;

    Ok(axum::Json(AssignmentResponse {
        signed_payload: signature.as_bytes().to_vec().into(),
        prover: state.signer.address(),
        max_block_id,
        max_proposed_in,
    }))
}

async fn check_liveness_bond(state: &AssignmentServerState) -> Result<(), AssignmentServerError> {
    let tx_list_config = state.rpc.protocol.get_tx_list_config().await?;
    let balance = state.rpc.l1.balance(state.signer.address()).await?;
    if balance < alloy_primitives::U256::from(tx_list_config.liveness_bond) {
        return Err(AssignmentServerError::InsufficientBond);
    }
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_fee_wire_round_trips_through_json() {
        let wire = TierFeeWire { tier: 100, fee: 42 };
        let json = serde_json::to_string(&wire).unwrap();
        let back: TierFeeWire = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tier, 100);
        assert_eq!(back.fee, 42);
    }
}
