use alloy_sol_types::SolValue;

use crate::error::DecodeError;
use crate::wire::{TierDescriptorAbi, TierProofAbi};

/// Tier ids are totally ordered; a higher id strictly dominates a lower one.
pub type TierId = u16;

/// An opaque, tier-tagged proof. The proof bytes themselves are produced by
/// a pluggable proof producer and are never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierProof {
    pub tier: TierId,
    pub data: Vec<u8>,
}

impl TierProof {
    pub fn encode(&self) -> Vec<u8> {
        TierProofAbi::from(self.clone()).abi_encode()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let abi =
            TierProofAbi::abi_decode(bytes, true).map_err(|e| DecodeError::Abi(e.to_string()))?;
        Ok(abi.into())
    }
}

impl From<TierProof> for TierProofAbi {
    fn from(p: TierProof) -> Self {
        TierProofAbi {
            tier: p.tier,
            data: p.data.into(),
        }
    }
}

impl From<TierProofAbi> for TierProof {
    fn from(a: TierProofAbi) -> Self {
        TierProof {
            tier: a.tier,
            data: a.data.into(),
        }
    }
}

/// A tier's immutable descriptor, fetched once per process start from the
/// tier provider contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDescriptor {
    pub id: TierId,
    pub proving_window: std::time::Duration,
}

impl From<TierDescriptorAbi> for TierDescriptor {
    fn from(a: TierDescriptorAbi) -> Self {
        TierDescriptor {
            id: a.id,
            proving_window: std::time::Duration::from_secs(a.provingWindow as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_payload() {
        let p = TierProof {
            tier: 100,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        assert_eq!(TierProof::decode(&p.encode()).unwrap(), p);
    }

    #[test]
    fn round_trips_empty_payload() {
        let p = TierProof { tier: 0, data: vec![] };
        assert_eq!(TierProof::decode(&p.encode()).unwrap(), p);
    }
}
