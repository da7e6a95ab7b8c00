//! Pure tier-selection decisions (4.5 "Tier selection on a new proposal").
//! Kept free of RPC/IO so the decision table is directly testable.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use rollup_types::TierDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Accept and prove at this tier id, immediately.
    Accept { tier: u16 },
    /// Not assigned to us and the window hasn't expired; come back once it
    /// has (the caller arms a forced re-check rather than a literal timer).
    WaitForExpiry { retry_after: Duration },
    /// Not our assignment, window expired, and this prover does not pick up
    /// unassigned blocks.
    Skip,
}

/// Table from 4.5: `P` is this prover's address, `A` the event's assigned
/// prover, `min_tier` the descriptor for `meta.minTier`, `proposed_at` the
/// block's L1 proposal timestamp (unix seconds).
pub fn decide(
    self_address: Address,
    assigned_prover: Address,
    min_tier: &TierDescriptor,
    proposed_at: u64,
    prove_unassigned_blocks: bool,
) -> Decision {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let expires_at = proposed_at + min_tier.proving_window.as_secs();
    let window_expired = now >= expires_at;

    if assigned_prover == self_address && !window_expired {
        return Decision::Accept { tier: min_tier.id };
    }
    if window_expired {
        return if prove_unassigned_blocks {
            Decision::Accept { tier: min_tier.id }
        } else if assigned_prover == self_address {
            Decision::Accept { tier: min_tier.id }
        } else {
            Decision::Skip
        };
    }
    Decision::WaitForExpiry { retry_after: Duration::from_secs(expires_at - now) }
}

/// Picks, among `tiers`, the lowest-id tier whose id is `>= min_tier_id` —
/// the submitter a block at `min_tier_id` is dispatched to (4.5 "On
/// acceptance").
pub fn submitter_tier(tiers: &[TierDescriptor], min_tier_id: u16) -> Option<TierDescriptor> {
    tiers.iter().filter(|t| t.id >= min_tier_id).min_by_key(|t| t.id).copied()
}

/// The next tier strictly above `current`, used for contest escalation.
pub fn next_tier(tiers: &[TierDescriptor], current: u16) -> Option<TierDescriptor> {
    tiers.iter().filter(|t| t.id > current).min_by_key(|t| t.id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(id: u16, window_secs: u64) -> TierDescriptor {
        TierDescriptor { id, proving_window: Duration::from_secs(window_secs) }
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    #[test]
    fn accepts_own_assignment_within_window() {
        let me = Address::repeat_byte(1);
        let decision = decide(me, me, &tier(100, 3_600), now(), false);
        assert_eq!(decision, Decision::Accept { tier: 100 });
    }

    #[test]
    fn waits_for_expiry_when_not_assigned_and_window_open() {
        let me = Address::repeat_byte(1);
        let other = Address::repeat_byte(2);
        let decision = decide(me, other, &tier(100, 3_600), now(), false);
        assert!(matches!(decision, Decision::WaitForExpiry { .. }));
    }

    #[test]
    fn skips_unassigned_expired_window_when_disabled() {
        let me = Address::repeat_byte(1);
        let other = Address::repeat_byte(2);
        let decision = decide(me, other, &tier(100, 0), now() - 10, false);
        assert_eq!(decision, Decision::Skip);
    }

    #[test]
    fn accepts_unassigned_expired_window_when_enabled() {
        let me = Address::repeat_byte(1);
        let other = Address::repeat_byte(2);
        let decision = decide(me, other, &tier(100, 0), now() - 10, true);
        assert_eq!(decision, Decision::Accept { tier: 100 });
    }

    #[test]
    fn submitter_tier_picks_lowest_qualifying_id() {
        let tiers = vec![tier(100, 0), tier(200, 0), tier(300, 0)];
        assert_eq!(submitter_tier(&tiers, 150).map(|t| t.id), Some(200));
        assert_eq!(submitter_tier(&tiers, 0).map(|t| t.id), Some(100));
        assert_eq!(submitter_tier(&tiers, 400), None);
    }

    #[test]
    fn next_tier_picks_lowest_strictly_above() {
        let tiers = vec![tier(100, 0), tier(200, 0), tier(300, 0)];
        assert_eq!(next_tier(&tiers, 100).map(|t| t.id), Some(200));
        assert_eq!(next_tier(&tiers, 300), None);
    }
}
