//! The protocol-mandated anchor transaction: a call to the L2 protocol
//! contract's `anchor(l1Hash, l1StateRoot, l1Height, parentGasUsed)`,
//! signed by the fixed golden-touch account and always prepended as
//! `txList[0]` (§4.2 step 9-10, invariant "Anchor is always txlist[0]").

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use rollup_rpc::reorg::{AnchorSnippetReader, AnchoredL1Snippet};
use rollup_rpc::{L2Client, RpcError};
use rollup_types::wire::ITaikoL2;

use crate::error::DriverError;

/// The L1 snippet an anchor transaction commits to, plus everything
/// needed to build and sign it.
#[derive(Debug, Clone, Copy)]
pub struct AnchorInput {
    pub l1_block_hash: B256,
    pub l1_state_root: B256,
    pub l1_height: u64,
    pub parent_gas_used: u64,
}

/// Builds and signs the anchor transaction for one L2 block, using the
/// golden-touch signer and its pending nonce at the parent block.
pub struct AnchorSigner {
    signer: PrivateKeySigner,
    taiko_l2: Address,
    l2_chain_id: u64,
    gas_limit: u64,
}

impl AnchorSigner {
    pub fn new(private_key_hex: &str, taiko_l2: Address, l2_chain_id: u64, gas_limit: u64) -> anyhow::Result<Self> {
        let bytes = hex::decode(private_key_hex.trim_start_matches("0x"))?;
        let signer = PrivateKeySigner::from_slice(&bytes)?;
        Ok(Self { signer, taiko_l2, l2_chain_id, gas_limit })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Encodes and signs the anchor call at `nonce`. Returns the raw
    /// EIP-2718-encoded transaction, ready to be the first entry of the
    /// combined tx list (§4.2 step 9-10).
    pub fn sign(&self, input: AnchorInput, nonce: u64, base_fee: u128) -> anyhow::Result<Bytes> {
        let call = ITaikoL2::anchorCall {
            l1Hash: input.l1_block_hash,
            l1StateRoot: input.l1_state_root,
            l1Height: input.l1_height,
            parentGasUsed: input.parent_gas_used as u32,
        };

        let mut unsigned = TxEip1559 {
            chain_id: self.l2_chain_id,
            nonce,
            gas_limit: self.gas_limit,
            // Golden-touch anchor calls never compete for inclusion with a
            // tip; the anchor's fee cap matches the block's base fee so it
            // neither under- nor over-pays (protocol-enforced at the
            // engine level).
            max_fee_per_gas: base_fee,
            max_priority_fee_per_gas: 0,
            to: TxKind::Call(self.taiko_l2),
            value: U256::ZERO,
            access_list: Default::default(),
            input: call.abi_encode().into(),
        };
        let signature = self
            .signer
            .sign_transaction_sync(&mut unsigned)
            .map_err(|e| anyhow::anyhow!("signing anchor transaction: {e}"))?;
        let envelope = TxEnvelope::Eip1559(unsigned.into_signed(signature));
        Ok(Bytes::from(envelope.encoded_2718()))
    }
}

/// Decodes the anchor snippet back out of an L2 block's first
/// transaction, for the reorg walk's anchor-embedded-L1-snippet check
/// (§4.2 "check_l1_reorg").
pub fn decode_anchor_snippet(raw_tx: &[u8]) -> Result<AnchorInput, DriverError> {
    let envelope = TxEnvelope::decode_2718(&mut &raw_tx[..])
        .map_err(|e| DriverError::Other(anyhow::anyhow!("decoding anchor tx envelope: {e}")))?;
    let input = match &envelope {
        TxEnvelope::Eip1559(signed) => signed.tx().input.clone(),
        TxEnvelope::Legacy(signed) => signed.tx().input.clone(),
        _ => return Err(DriverError::Other(anyhow::anyhow!("unexpected anchor tx type"))),
    };

    let call = ITaikoL2::anchorCall::abi_decode(&input, true)
        .map_err(|e| DriverError::Other(anyhow::anyhow!("decoding anchor calldata: {e}")))?;

    Ok(AnchorInput {
        l1_block_hash: call.l1Hash,
        l1_state_root: call.l1StateRoot,
        l1_height: call.l1Height,
        parent_gas_used: call.parentGasUsed as u64,
    })
}

/// Reads the anchor snippet embedded in the first transaction of L2 block
/// `block_id`, over plain JSON-RPC (`eth_getBlockByNumber` with full
/// transactions). Implements `rollup_rpc`'s `AnchorSnippetReader` so the
/// reorg walk can stay transport-agnostic about anchor calldata (DESIGN
/// NOTES §9 "Cyclic references").
pub struct L2AnchorReader {
    l2: L2Client,
}

impl L2AnchorReader {
    pub fn new(l2: L2Client) -> Self {
        Self { l2 }
    }
}

#[async_trait]
impl AnchorSnippetReader for L2AnchorReader {
    async fn read_anchor_snippet(&self, l2_block_id: u64) -> Result<AnchoredL1Snippet, RpcError> {
        let raw_tx = self.l2.first_transaction_raw(l2_block_id).await?;
        let snippet = decode_anchor_snippet(&raw_tx)
            .map_err(|e| RpcError::Other(anyhow::anyhow!("{e}")))?;
        Ok(AnchoredL1Snippet {
            l1_block_hash: snippet.l1_block_hash,
            l1_state_root: snippet.l1_state_root,
            l1_height: snippet.l1_height,
            parent_gas_used: snippet.parent_gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AnchorSigner {
        AnchorSigner::new(
            "92954368afd3caa1f3ce3ead0069c1af414054aefe1ef9aeacc1bf426222ce3",
            Address::repeat_byte(0x42),
            167000,
            250_000,
        )
        .unwrap()
    }

    #[test]
    fn round_trips_through_signing_and_decoding() {
        let anchor = signer();
        let input = AnchorInput {
            l1_block_hash: B256::repeat_byte(1),
            l1_state_root: B256::repeat_byte(2),
            l1_height: 19_000_000,
            parent_gas_used: 12_345_678,
        };
        let raw = anchor.sign(input, 7, 1_000_000_000).unwrap();
        let decoded = decode_anchor_snippet(&raw).unwrap();
        assert_eq!(decoded.l1_block_hash, input.l1_block_hash);
        assert_eq!(decoded.l1_state_root, input.l1_state_root);
        assert_eq!(decoded.l1_height, input.l1_height);
        assert_eq!(decoded.parent_gas_used, input.parent_gas_used);
    }
}
