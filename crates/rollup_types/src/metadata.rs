use alloy_primitives::{Address, B256};
use alloy_sol_types::SolValue;

use crate::error::DecodeError;
use crate::wire::BlockMetadataAbi;

/// Protocol-defined block metadata, bit-exact on the wire.
///
/// `id` is strictly monotonic and consecutive starting at the protocol
/// genesis id; `parent_meta_hash` chains the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMetadata {
    pub l1_hash: B256,
    pub difficulty: B256,
    pub blob_hash: B256,
    pub extra_data: B256,
    pub deposits_hash: B256,
    pub coinbase: Address,
    pub id: u64,
    pub gas_limit: u32,
    pub timestamp: u64,
    pub l1_height: u64,
    pub tx_list_byte_offset: u32,
    pub tx_list_byte_size: u32,
    pub min_tier: u16,
    pub blob_used: bool,
    pub parent_meta_hash: B256,
}

impl BlockMetadata {
    pub fn encode(&self) -> Vec<u8> {
        BlockMetadataAbi::from(self.clone()).abi_encode()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let abi = BlockMetadataAbi::abi_decode(bytes, true)
            .map_err(|e| DecodeError::Abi(e.to_string()))?;
        Ok(abi.into())
    }
}

impl From<BlockMetadata> for BlockMetadataAbi {
    fn from(m: BlockMetadata) -> Self {
        BlockMetadataAbi {
            l1Hash: m.l1_hash,
            difficulty: m.difficulty,
            blobHash: m.blob_hash,
            extraData: m.extra_data,
            depositsHash: m.deposits_hash,
            coinbase: m.coinbase,
            id: m.id,
            gasLimit: m.gas_limit,
            timestamp: m.timestamp,
            l1Height: m.l1_height,
            txListByteOffset: m.tx_list_byte_offset,
            txListByteSize: m.tx_list_byte_size,
            minTier: m.min_tier,
            blobUsed: m.blob_used,
            parentMetaHash: m.parent_meta_hash,
        }
    }
}

impl From<BlockMetadataAbi> for BlockMetadata {
    fn from(a: BlockMetadataAbi) -> Self {
        BlockMetadata {
            l1_hash: a.l1Hash,
            difficulty: a.difficulty,
            blob_hash: a.blobHash,
            extra_data: a.extraData,
            deposits_hash: a.depositsHash,
            coinbase: a.coinbase,
            id: a.id,
            gas_limit: a.gasLimit,
            timestamp: a.timestamp,
            l1_height: a.l1Height,
            tx_list_byte_offset: a.txListByteOffset,
            tx_list_byte_size: a.txListByteSize,
            min_tier: a.minTier,
            blob_used: a.blobUsed,
            parent_meta_hash: a.parentMetaHash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockMetadata {
        BlockMetadata {
            l1_hash: B256::repeat_byte(1),
            difficulty: B256::repeat_byte(2),
            blob_hash: B256::ZERO,
            extra_data: B256::repeat_byte(3),
            deposits_hash: B256::repeat_byte(4),
            coinbase: Address::repeat_byte(5),
            id: 42,
            gas_limit: 15_000_000,
            timestamp: 1_700_000_000,
            l1_height: 19_000_000,
            tx_list_byte_offset: 128,
            tx_list_byte_size: 4096,
            min_tier: 100,
            blob_used: false,
            parent_meta_hash: B256::repeat_byte(6),
        }
    }

    #[test]
    fn round_trips_through_abi_encoding() {
        let meta = sample();
        let decoded = BlockMetadata::decode(&meta.encode()).unwrap();
        assert_eq!(meta, decoded);
    }

    #[test]
    fn rejects_truncated_payloads() {
        let meta = sample();
        let mut bytes = meta.encode();
        bytes.truncate(bytes.len() / 2);
        assert!(BlockMetadata::decode(&bytes).is_err());
    }
}
