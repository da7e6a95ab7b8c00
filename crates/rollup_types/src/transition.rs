use alloy_primitives::B256;
use alloy_sol_types::SolValue;

use crate::error::DecodeError;
use crate::wire::TransitionAbi;

/// A proposed state transition for one block id.
///
/// For a given block id and `parent_hash`, at most one accepted transition
/// exists at each tier id at any time; a contest opens an escalation to the
/// next higher tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub parent_hash: B256,
    pub block_hash: B256,
    pub state_root: B256,
    pub graffiti: B256,
}

impl Transition {
    /// Whether `self` and `other` agree on the fields a prover actually
    /// derives (parent hash, block hash, state root) — graffiti is operator
    /// vanity and is excluded from the contest comparison.
    pub fn matches_derived(&self, other: &Transition) -> bool {
        self.parent_hash == other.parent_hash
            && self.block_hash == other.block_hash
            && self.state_root == other.state_root
    }

    pub fn encode(&self) -> Vec<u8> {
        TransitionAbi::from(self.clone()).abi_encode()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let abi =
            TransitionAbi::abi_decode(bytes, true).map_err(|e| DecodeError::Abi(e.to_string()))?;
        Ok(abi.into())
    }
}

impl From<Transition> for TransitionAbi {
    fn from(t: Transition) -> Self {
        TransitionAbi {
            parentHash: t.parent_hash,
            blockHash: t.block_hash,
            stateRoot: t.state_root,
            graffiti: t.graffiti,
        }
    }
}

impl From<TransitionAbi> for Transition {
    fn from(a: TransitionAbi) -> Self {
        Transition {
            parent_hash: a.parentHash,
            block_hash: a.blockHash,
            state_root: a.stateRoot,
            graffiti: a.graffiti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let t = Transition {
            parent_hash: B256::repeat_byte(1),
            block_hash: B256::repeat_byte(2),
            state_root: B256::repeat_byte(3),
            graffiti: B256::ZERO,
        };
        assert_eq!(Transition::decode(&t.encode()).unwrap(), t);
    }

    #[test]
    fn matches_derived_ignores_graffiti() {
        let a = Transition {
            parent_hash: B256::repeat_byte(1),
            block_hash: B256::repeat_byte(2),
            state_root: B256::repeat_byte(3),
            graffiti: B256::repeat_byte(9),
        };
        let mut b = a.clone();
        b.graffiti = B256::ZERO;
        assert!(a.matches_derived(&b));

        let mut c = a.clone();
        c.state_root = B256::repeat_byte(0xaa);
        assert!(!a.matches_derived(&c));
    }
}
