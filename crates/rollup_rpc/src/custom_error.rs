//! Maps a reverted call's return data back to the protocol's named custom
//! error, the way `bindings/encoding.TryParsingCustomError` walks the
//! generated contract ABIs' error maps looking for a 4-byte selector match.
//!
//! We don't have generated ABI JSON to draw the error set from at runtime,
//! so the selectors are computed once from the well-known Solidity error
//! signatures and cached in a static table.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use sha3::{Digest, Keccak256};

/// Custom error signatures declared across the protocol's `TaikoL1`,
/// `TaikoL2`, `LibProposing`, `LibProving`, `LibVerifying`, `LibUtils` and
/// `AssignmentHook` contracts.
const CUSTOM_ERROR_SIGNATURES: &[&str] = &[
    "L1_ALREADY_PROVEN()",
    "L1_BLOCK_MISMATCH()",
    "L1_FORK_CHOICE_NOT_FOUND()",
    "L1_INVALID_CONFIG()",
    "L1_INVALID_ETH_DEPOSIT()",
    "L1_INVALID_PARAM()",
    "L1_INVALID_PROOF()",
    "L1_INVALID_TIER()",
    "L1_INVALID_TRANSITION()",
    "L1_NOT_ASSIGNED_PROVER()",
    "L1_PROVING_PAUSED()",
    "L1_RECEIVE_DISABLED()",
    "L1_SAME_PROOF()",
    "L1_TIER_NOT_FOUND()",
    "L1_TOO_LATE()",
    "L1_TOO_MANY_BLOCKS()",
    "L1_TRANSITION_NOT_FOUND()",
    "L1_UNAUTHORIZED()",
    "L1_UNEXPECTED_PARENT()",
    "L2_BASEFEE_MISMATCH()",
    "L2_INVALID_1559_PARAMS()",
    "L2_INVALID_SENDER()",
    "L2_PUBLIC_INPUT_HASH_MISMATCH()",
    "L2_TOO_LATE()",
    "ASSIGNMENT_EXPIRED()",
    "ASSIGNMENT_INSUFFICIENT_FEE()",
    "ASSIGNMENT_INVALID_SIG()",
    "INVALID_PAUSE_STATUS()",
    "RESOLVER_DENIED()",
    "RESOLVER_INVALID_ADDR()",
    "RESOLVER_ZERO_ADDR()",
];

static SELECTOR_TABLE: Lazy<HashMap<[u8; 4], &'static str>> = Lazy::new(|| {
    CUSTOM_ERROR_SIGNATURES
        .iter()
        .map(|sig| {
            let digest = Keccak256::digest(sig.as_bytes());
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&digest[..4]);
            (selector, name_of(sig))
        })
        .collect()
});

fn name_of(signature: &str) -> &'static str {
    CUSTOM_ERROR_SIGNATURES
        .iter()
        .find(|s| **s == signature)
        .copied()
        .unwrap_or(signature)
        .split('(')
        .next()
        .unwrap()
}

/// Given the raw error return data from a reverted call (with or without a
/// leading `0x`), returns the matched custom error name, or the original
/// hex string unchanged if no selector in the table matches.
///
/// Mirrors `getErrorData` + `TryParsingCustomError`: a geth node surfaces
/// the revert data directly; a Hardhat node instead embeds the selector in
/// a human-readable message ending in `(return data: 0x........)`, which
/// callers should extract before calling this (see
/// [`extract_hardhat_selector`]).
pub fn decode_contract_error(error_data: &str) -> String {
    let trimmed = error_data.trim_start_matches("0x");
    if trimmed.is_empty() {
        return error_data.to_string();
    }

    let Ok(bytes) = hex::decode(trimmed) else {
        return error_data.to_string();
    };
    if bytes.len() < 4 {
        return error_data.to_string();
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&bytes[..4]);
    SELECTOR_TABLE
        .get(&selector)
        .map(|name| name.to_string())
        .unwrap_or_else(|| error_data.to_string())
}

/// Pulls the trailing `0x........` selector out of a Hardhat
/// "reverted with an unrecognized custom error (return data: 0x........)"
/// message, if present.
pub fn extract_hardhat_selector(message: &str) -> Option<String> {
    static PATTERN: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"return data: (0x[0-9a-fA-F]{8})").unwrap());
    PATTERN
        .captures(message)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_selector() {
        let digest = Keccak256::digest(b"L1_FORK_CHOICE_NOT_FOUND()");
        let selector = hex::encode(&digest[..4]);
        assert_eq!(decode_contract_error(&format!("0x{selector}")), "L1_FORK_CHOICE_NOT_FOUND");
    }

    #[test]
    fn passes_through_unknown_selector() {
        assert_eq!(decode_contract_error("0xdeadbeef"), "0xdeadbeef");
    }

    #[test]
    fn passes_through_empty_data() {
        assert_eq!(decode_contract_error("0x"), "0x");
    }

    #[test]
    fn extracts_hardhat_embedded_selector() {
        let msg = "VM Exception while processing transaction: reverted with an unrecognized custom error (return data: 0xb6d363fd)";
        assert_eq!(extract_hardhat_selector(msg), Some("0xb6d363fd".to_string()));
    }
}
