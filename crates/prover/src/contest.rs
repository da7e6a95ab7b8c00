//! Local re-derivation of a transition for the contester cross-check
//! (4.5 "On `TransitionProved`"): parent hash via `l2_parent_by_block_id`,
//! block hash via the L2 engine's header, signal root via a storage proof
//! read against the signal service contract.

use alloy_primitives::{Address, B256};
use rollup_rpc::RpcClient;
use rollup_types::Transition;

use crate::error::ProverError;

/// Derives the transition this node believes is correct for `block_id`,
/// to be compared against a `TransitionProved` event with
/// [`Transition::matches_derived`].
pub async fn derive_local_transition(
    rpc: &RpcClient,
    signal_service: Address,
    block_id: u64,
) -> Result<Transition, ProverError> {
    let parent = rpc.l2_parent_by_block_id(block_id).await?;
    let block = rpc.l2.header_by_number(Some(block_id)).await?;
    let signal_root = rpc.l2.storage_root(signal_service, block_id).await?;

    Ok(Transition {
        parent_hash: parent.hash,
        block_hash: block.hash,
        state_root: signal_root,
        graffiti: B256::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graffiti_is_excluded_from_contest_comparison() {
        let derived = Transition {
            parent_hash: B256::repeat_byte(1),
            block_hash: B256::repeat_byte(2),
            state_root: B256::repeat_byte(3),
            graffiti: B256::ZERO,
        };
        let reported = Transition { graffiti: B256::repeat_byte(0xaa), ..derived.clone() };
        assert!(derived.matches_derived(&reported));
    }

    #[test]
    fn state_root_mismatch_fails_the_check() {
        let derived = Transition {
            parent_hash: B256::repeat_byte(1),
            block_hash: B256::repeat_byte(2),
            state_root: B256::repeat_byte(3),
            graffiti: B256::ZERO,
        };
        let reported = Transition { state_root: B256::repeat_byte(0xff), ..derived.clone() };
        assert!(!derived.matches_derived(&reported));
    }
}
