//! Pluggable proof producers (4.5 "Proof producers"): given a block, each
//! returns a [`TierProof`] tagged with its own tier id. All three variants
//! are best-effort cancellable through a shared flag the submission path
//! checks before using the result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use rollup_types::{BlockMetadata, TierProof};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::ProverError;

/// Shared best-effort cancellation flag for one in-flight proof request.
/// Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a proof producer needs to know about the block it's proving.
#[derive(Debug, Clone)]
pub struct ProofRequest {
    pub block_id: u64,
    pub tier: u16,
    pub meta: BlockMetadata,
    pub prover_address: Address,
    pub l1_ws_url: String,
    pub l2_ws_url: String,
    pub l1_beacon_url: Option<String>,
    pub graffiti: B256,
}

#[async_trait::async_trait]
pub trait ProofProducer: Send + Sync {
    async fn produce(&self, request: &ProofRequest, cancel: CancelToken) -> Result<TierProof, ProverError>;
}

/// Returns a placeholder proof with no external interaction — stands in
/// for a tier whose verifier accepts any well-formed bytes.
pub struct OptimisticProducer;

#[async_trait::async_trait]
impl ProofProducer for OptimisticProducer {
    async fn produce(&self, request: &ProofRequest, _cancel: CancelToken) -> Result<TierProof, ProverError> {
        Ok(TierProof { tier: request.tier, data: vec![0u8; 1] })
    }
}

/// The literal proof payload a guardian submits when it isn't generating a
/// tiered proof and is instead just returning the liveness bond.
pub fn return_liveness_bond_sentinel() -> [u8; 32] {
    Keccak256::digest(b"RETURN_LIVENESS_BOND").into()
}

/// Approves via the guardian path instead of computing a proof; submission
/// reads [`return_liveness_bond_sentinel`] to decide which calldata to use.
pub struct GuardianProducer;

#[async_trait::async_trait]
impl ProofProducer for GuardianProducer {
    async fn produce(&self, request: &ProofRequest, _cancel: CancelToken) -> Result<TierProof, ProverError> {
        Ok(TierProof { tier: request.tier, data: return_liveness_bond_sentinel().to_vec() })
    }
}

#[derive(Debug, Serialize)]
struct RaikoRequest<'a> {
    block: u64,
    l1_endpoint: &'a str,
    l2_endpoint: &'a str,
    l1_beacon_endpoint: Option<&'a str>,
    prover: Address,
    graffiti: B256,
}

#[derive(Debug, Deserialize)]
struct RaikoResponse {
    status: String,
    #[serde(default)]
    proof: Option<String>,
}

/// Posts a proving request to a raiko (SGX) host and polls until it
/// reports `status == "success"`, returning the attested proof bytes.
pub struct RaikoProducer {
    client: reqwest::Client,
    host: String,
    poll_interval: Duration,
}

impl RaikoProducer {
    pub fn new(host: String, poll_interval: Duration) -> Self {
        Self { client: reqwest::Client::new(), host, poll_interval }
    }
}

#[async_trait::async_trait]
impl ProofProducer for RaikoProducer {
    async fn produce(&self, request: &ProofRequest, cancel: CancelToken) -> Result<TierProof, ProverError> {
        let body = RaikoRequest {
            block: request.block_id,
            l1_endpoint: &request.l1_ws_url,
            l2_endpoint: &request.l2_ws_url,
            l1_beacon_endpoint: request.l1_beacon_url.as_deref(),
            prover: request.prover_address,
            graffiti: request.graffiti,
        };

        self.client
            .post(format!("{}/v1/proof", self.host))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProverError::Producer(format!("raiko request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ProverError::Producer(format!("raiko request rejected: {e}")))?;

        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            if cancel.is_cancelled() {
                return Err(ProverError::Producer("cancelled while polling raiko".to_string()));
            }

            let response: RaikoResponse = self
                .client
                .get(format!("{}/v1/proof/{}", self.host, request.block_id))
                .send()
                .await
                .map_err(|e| ProverError::Producer(format!("raiko poll failed: {e}")))?
                .json()
                .await
                .map_err(|e| ProverError::Producer(format!("raiko poll response undecodable: {e}")))?;

            match response.status.as_str() {
                "success" => {
                    let proof_hex = response
                        .proof
                        .ok_or_else(|| ProverError::Producer("raiko reported success with no proof".to_string()))?;
                    let data = hex::decode(proof_hex.trim_start_matches("0x"))
                        .map_err(|e| ProverError::Producer(format!("raiko proof not hex: {e}")))?;
                    return Ok(TierProof { tier: request.tier, data });
                }
                "error" | "failed" => {
                    return Err(ProverError::Producer(format!("raiko reported failure for block {}", request.block_id)));
                }
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_reports_cancellation() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn liveness_bond_sentinel_is_stable() {
        let sentinel = return_liveness_bond_sentinel();
        assert_eq!(sentinel, return_liveness_bond_sentinel());
        assert_eq!(sentinel.len(), 32);
    }

    #[tokio::test]
    async fn optimistic_producer_returns_immediately() {
        let request = ProofRequest {
            block_id: 1,
            tier: 100,
            meta: sample_meta(),
            prover_address: Address::ZERO,
            l1_ws_url: String::new(),
            l2_ws_url: String::new(),
            l1_beacon_url: None,
            graffiti: B256::ZERO,
        };
        let proof = OptimisticProducer.produce(&request, CancelToken::new()).await.unwrap();
        assert_eq!(proof.tier, 100);
    }

    fn sample_meta() -> BlockMetadata {
        BlockMetadata {
            l1_hash: B256::ZERO,
            difficulty: B256::ZERO,
            blob_hash: B256::ZERO,
            extra_data: B256::ZERO,
            deposits_hash: B256::ZERO,
            coinbase: Address::ZERO,
            id: 1,
            gas_limit: 0,
            timestamp: 0,
            l1_height: 0,
            tx_list_byte_offset: 0,
            tx_list_byte_size: 0,
            min_tier: 100,
            blob_used: false,
            parent_meta_hash: B256::ZERO,
        }
    }
}
