/// Read-only mirror of the protocol's on-chain state slots, fetched in a
/// single `getStateVariables` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolState {
    pub genesis_height: u64,
    pub num_blocks: u64,
    pub last_verified_block_id: u64,
    pub last_verified_at: u64,
}

impl ProtocolState {
    /// The protocol's `numBlocks - 1`.
    pub fn highest_block_id(&self) -> u64 {
        self.num_blocks.saturating_sub(1)
    }
}

/// Constants bounding the tx list a `BlockProposed` event may carry,
/// fetched once at driver startup from the protocol's `getConfig()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxListConfig {
    pub block_max_gas_limit: u64,
    pub block_max_num_txs: u64,
    pub block_max_tx_list_bytes: u64,
    pub min_tx_gas_limit: u64,
    /// Bond a prover must hold on L1 to be assigned a block; also the
    /// minimum balance the assignment server checks before signing a bid.
    pub liveness_bond: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_block_id_handles_zero_blocks() {
        let state = ProtocolState::default();
        assert_eq!(state.highest_block_id(), 0);
    }

    #[test]
    fn highest_block_id_is_count_minus_one() {
        let state = ProtocolState { num_blocks: 10, ..Default::default() };
        assert_eq!(state.highest_block_id(), 9);
    }
}
