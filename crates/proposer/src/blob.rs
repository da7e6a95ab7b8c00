//! EIP-4844 blob path: packs the compressed tx list into one blob's field
//! elements, computes its KZG commitment and proof, and derives the
//! versioned hash the protocol records in `BlockMetadata.blob_hash`
//! (§4.4 step 2 "Optional blob path").
//!
//! Mirrors [`rollup_rpc::blob::BlobFetcher`]'s consuming side: that module
//! fetches a sidecar and checks its commitment hashes to a known versioned
//! hash; this module is the producing side, building the sidecar the
//! proposer broadcasts alongside the L1 transaction.

use alloy_eips::eip4844::{kzg_to_versioned_hash, Blob, BYTES_PER_BLOB};
use alloy_primitives::B256;
use c_kzg::{KzgCommitment, KzgProof, KzgSettings};

use crate::error::ProposerError;

pub struct BlobSidecar {
    pub blob: Blob,
    pub commitment: [u8; 48],
    pub proof: [u8; 48],
    pub versioned_hash: B256,
}

/// Packs `data` into one blob's worth of field elements. Each 32-byte
/// field element's top byte is zeroed to keep it below the BLS12-381
/// scalar field modulus, mirroring how `c-kzg`'s own blob encoding pads
/// field elements; data beyond one blob's capacity (~126 KiB после
/// padding) is rejected rather than silently truncated.
pub fn pack_into_blob(data: &[u8]) -> Result<Blob, ProposerError> {
    const FIELD_ELEMENTS: usize = BYTES_PER_BLOB / 32;
    const USABLE_BYTES_PER_ELEMENT: usize = 31;
    let capacity = FIELD_ELEMENTS * USABLE_BYTES_PER_ELEMENT;

    if data.len() > capacity {
        return Err(ProposerError::Other(anyhow::anyhow!(
            "compressed tx list ({} bytes) exceeds one blob's capacity ({} bytes)",
            data.len(),
            capacity
        )));
    }

    let mut blob = Blob::default();
    for (i, chunk) in data.chunks(USABLE_BYTES_PER_ELEMENT).enumerate() {
        let start = i * 32;
        blob[start + 1..start + 1 + chunk.len()].copy_from_slice(chunk);
    }
    Ok(blob)
}

/// Builds the full sidecar for `data`, loading the trusted setup from
/// `setup_path` fresh each call. Proposers publish blobs rarely enough
/// relative to the cost of parsing the setup file that caching it is not
/// worth the added state; revisit if blob proposals become the common
/// case.
pub fn build_sidecar(data: &[u8], setup_path: &std::path::Path) -> Result<BlobSidecar, ProposerError> {
    let blob = pack_into_blob(data)?;

    let settings = KzgSettings::load_trusted_setup_file(setup_path)
        .map_err(|e| ProposerError::Other(anyhow::anyhow!("loading KZG trusted setup: {e}")))?;

    let c_kzg_blob = c_kzg::Blob::from_bytes(blob.as_slice())
        .map_err(|e| ProposerError::Other(anyhow::anyhow!("converting blob for KZG: {e}")))?;

    let commitment = KzgCommitment::blob_to_kzg_commitment(&c_kzg_blob, &settings)
        .map_err(|e| ProposerError::Other(anyhow::anyhow!("computing KZG commitment: {e}")))?;

    let proof = KzgProof::compute_blob_kzg_proof(&c_kzg_blob, &commitment.to_bytes(), &settings)
        .map_err(|e| ProposerError::Other(anyhow::anyhow!("computing KZG proof: {e}")))?;

    let commitment_bytes: [u8; 48] = commitment.to_bytes().into_inner();
    let proof_bytes: [u8; 48] = proof.to_bytes().into_inner();
    let versioned_hash = kzg_to_versioned_hash(&commitment_bytes);

    Ok(BlobSidecar { blob, commitment: commitment_bytes, proof: proof_bytes, versioned_hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_short_data_into_first_field_elements() {
        let data = vec![0xAB; 100];
        let blob = pack_into_blob(&data).unwrap();
        assert_eq!(&blob[1..32], &data[..31]);
    }

    #[test]
    fn rejects_data_larger_than_one_blob() {
        let data = vec![0u8; 200_000];
        assert!(pack_into_blob(&data).is_err());
    }
}
