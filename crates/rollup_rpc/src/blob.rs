//! Blob sidecar fetch and KZG commitment verification for blob-carrying
//! proposals.
//!
//! `BlockMetadata.blob_hash` is a versioned KZG hash (EIP-4844 §
//! `kzg_to_versioned_hash`), not a blob's contents; recovering the tx list
//! means fetching the blob itself from a beacon node's sidecar API (L1
//! execution clients do not retain historical blobs) and checking its
//! commitment hashes to the value the protocol recorded.

use alloy_eips::eip4844::{kzg_to_versioned_hash, Blob, BYTES_PER_BLOB};
use alloy_primitives::B256;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::RpcError;

#[derive(Debug, Deserialize)]
struct SidecarResponse {
    data: Vec<SidecarEntry>,
}

#[derive(Debug, Deserialize)]
struct SidecarEntry {
    blob: String,
    kzg_commitment: String,
}

pub struct BlobFetcher {
    beacon_url: String,
    http: HttpClient,
}

impl BlobFetcher {
    pub fn new(beacon_url: String) -> Self {
        Self { beacon_url, http: HttpClient::new() }
    }

    /// Fetches every blob sidecar attached to the beacon block at `slot`
    /// and returns the one whose KZG commitment matches `versioned_hash`.
    pub async fn fetch_matching_blob(
        &self,
        slot: u64,
        versioned_hash: B256,
    ) -> Result<Blob, RpcError> {
        let url = format!("{}/eth/v1/beacon/blob_sidecars/{slot}", self.beacon_url);
        let resp: SidecarResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RpcError::Other(anyhow::anyhow!("fetching blob sidecars: {e}")))?
            .json()
            .await
            .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding blob sidecars: {e}")))?;

        for entry in resp.data {
            let commitment_bytes = hex::decode(entry.kzg_commitment.trim_start_matches("0x"))
                .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding kzg commitment: {e}")))?;
            let mut commitment = [0u8; 48];
            commitment.copy_from_slice(&commitment_bytes);

            if kzg_to_versioned_hash(&commitment) == versioned_hash {
                let blob_bytes = hex::decode(entry.blob.trim_start_matches("0x"))
                    .map_err(|e| RpcError::Other(anyhow::anyhow!("decoding blob: {e}")))?;
                if blob_bytes.len() != BYTES_PER_BLOB {
                    return Err(RpcError::Other(anyhow::anyhow!(
                        "blob has unexpected length {}, want {BYTES_PER_BLOB}",
                        blob_bytes.len()
                    )));
                }
                let mut blob = Blob::default();
                blob.copy_from_slice(&blob_bytes);
                return Ok(blob);
            }
        }

        Err(RpcError::NotFound("matching blob sidecar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_stores_configured_url() {
        let fetcher = BlobFetcher::new("http://localhost:5052".to_string());
        assert_eq!(fetcher.beacon_url, "http://localhost:5052");
    }
}
