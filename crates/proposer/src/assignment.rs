//! Prover assignment bidding: calls each configured prover's `/assignment`
//! endpoint in parallel, escalating the offered tier fees on each retry
//! round until one prover signs or the bump cap is reached (§4.4 step 2).
//!
//! The signed payload's `metaHash`/`parentMetaHash` are always zero at bid
//! time — neither side knows the block's final on-chain meta hash until
//! after `proposeBlock` executes, so the commitment only binds chain id,
//! contract addresses, the tx list's content hash, fee terms, and the
//! block-id window the prover is willing to cover (§4.8). `maxBlockId`
//! and `maxProposedIn` are computed server-side and only known from the
//! response, so the digest used to verify the signature is built from the
//! response, not the request.

use std::time::Duration;

use alloy_primitives::{Address, Signature, B256};
use rollup_config::ProposerConfig;
use rollup_types::{AssignmentPayload, TierFee};
use serde::{Deserialize, Serialize};

use crate::error::ProposerError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRequest {
    fee_token: Address,
    tier_fees: Vec<TierFeeWire>,
    expiry: u64,
    tx_list_hash: B256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeeWire {
    pub tier: u16,
    pub fee: u128,
}

impl From<TierFee> for TierFeeWire {
    fn from(f: TierFee) -> Self {
        TierFeeWire { tier: f.tier, fee: f.fee }
    }
}

impl From<TierFeeWire> for TierFee {
    fn from(f: TierFeeWire) -> Self {
        TierFee { tier: f.tier, fee: f.fee }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentResponse {
    signed_payload: alloy_primitives::Bytes,
    prover: Address,
    max_block_id: u64,
    max_proposed_in: u64,
}

/// A won bid: the prover that accepted, its signature over the assignment
/// payload, and the block-id bound it asserted.
#[derive(Debug, Clone)]
pub struct WonBid {
    pub prover: Address,
    pub signature: Vec<u8>,
    pub max_block_id: u64,
    pub max_proposed_in: u64,
    pub tier_fees: Vec<TierFee>,
}

/// Everything needed to reconstruct the digest a prover signs, except the
/// `maxBlockId`/`maxProposedIn` pair it returns in the response.
pub struct AssignmentContext {
    pub chain_id: u64,
    pub taiko_l1: Address,
    pub assignment_hook: Address,
    pub tx_list_hash: B256,
    pub expiry: u64,
    pub starting_tier_fees: Vec<TierFee>,
}

/// Runs the bidding ladder for one tx list: tries every configured
/// endpoint in parallel at the starting fees, and on an empty round bumps
/// every tier's fee by `tier_fee_price_bump_percent` and retries, up to
/// `max_tier_fee_price_bumps` rounds.
pub async fn bid_for_assignment(
    config: &ProposerConfig,
    ctx: &AssignmentContext,
) -> Result<WonBid, ProposerError> {
    let client = reqwest::Client::builder()
        .timeout(config.assignment_timeout())
        .build()
        .map_err(|e| ProposerError::Other(anyhow::anyhow!("building HTTP client: {e}")))?;

    let mut tier_fees = ctx.starting_tier_fees.clone();

    for round in 0..=config.max_tier_fee_price_bumps {
        let request = AssignmentRequest {
            fee_token: Address::ZERO,
            tier_fees: tier_fees.iter().copied().map(TierFeeWire::from).collect(),
            expiry: ctx.expiry,
            tx_list_hash: ctx.tx_list_hash,
        };

        if let Some(bid) = try_round(&client, &config.prover_endpoints, &request, ctx, &tier_fees).await {
            return Ok(bid);
        }

        tracing::info!(round, "no prover accepted assignment bid, bumping tier fees");
        tier_fees = bump_fees(&tier_fees, config.tier_fee_price_bump_percent);
    }

    Err(ProposerError::NoProverAccepted { rounds: config.max_tier_fee_price_bumps })
}

async fn try_round(
    client: &reqwest::Client,
    endpoints: &[String],
    request: &AssignmentRequest,
    ctx: &AssignmentContext,
    tier_fees: &[TierFee],
) -> Option<WonBid> {
    let attempts = endpoints.iter().map(|endpoint| call_one(client, endpoint, request, ctx, tier_fees));
    let results = futures::future::join_all(attempts).await;
    results.into_iter().flatten().next()
}

async fn call_one(
    client: &reqwest::Client,
    endpoint: &str,
    request: &AssignmentRequest,
    ctx: &AssignmentContext,
    tier_fees: &[TierFee],
) -> Option<WonBid> {
    let url = format!("{endpoint}/assignment");
    let resp = match client.post(&url).json(request).send().await {
        Ok(r) => r,
        Err(err) => {
            tracing::debug!(%err, endpoint, "assignment request failed");
            return None;
        }
    };

    if !resp.status().is_success() {
        tracing::debug!(status = %resp.status(), endpoint, "prover declined assignment");
        return None;
    }

    let body: AssignmentResponse = match resp.json().await {
        Ok(b) => b,
        Err(err) => {
            tracing::warn!(%err, endpoint, "could not decode assignment response");
            return None;
        }
    };

    let payload = AssignmentPayload {
        chain_id: ctx.chain_id,
        taiko_l1: ctx.taiko_l1,
        assignment_hook: ctx.assignment_hook,
        meta_hash: B256::ZERO,
        parent_meta_hash: B256::ZERO,
        blob_hash: ctx.tx_list_hash,
        fee_token: Address::ZERO,
        expiry: ctx.expiry,
        max_block_id: body.max_block_id,
        max_proposed_in: body.max_proposed_in,
        tier_fees: tier_fees.to_vec(),
    };
    let digest = payload.digest();

    let signature = match Signature::try_from(body.signed_payload.as_ref()) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(%err, endpoint, "assignment response signature malformed");
            return None;
        }
    };

    let recovered = match signature.recover_address_from_prehash(&digest) {
        Ok(addr) => addr,
        Err(err) => {
            tracing::warn!(%err, endpoint, "could not recover signer from assignment signature");
            return None;
        }
    };

    if recovered != body.prover {
        tracing::warn!(endpoint, claimed = %body.prover, recovered = %recovered, "assignment signature does not match claimed prover");
        return None;
    }

    Some(WonBid {
        prover: body.prover,
        signature: body.signed_payload.to_vec(),
        max_block_id: body.max_block_id,
        max_proposed_in: body.max_proposed_in,
        tier_fees: tier_fees.to_vec(),
    })
}

fn bump_fees(tier_fees: &[TierFee], percent: u32) -> Vec<TierFee> {
    tier_fees
        .iter()
        .map(|f| TierFee { tier: f.tier, fee: f.fee.saturating_mul(100 + percent as u128) / 100 })
        .collect()
}

/// `now + window`, used to build the outgoing assignment request's
/// `expiry` field.
pub fn expiry_from_now(window: Duration) -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    (now + window).as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_fees_applies_percent_to_every_tier() {
        let fees = vec![TierFee { tier: 100, fee: 1_000 }, TierFee { tier: 200, fee: 2_000 }];
        let bumped = bump_fees(&fees, 10);
        assert_eq!(bumped[0].fee, 1_100);
        assert_eq!(bumped[1].fee, 2_200);
    }
}
