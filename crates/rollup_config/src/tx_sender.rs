use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the shared tx sender (§4.6).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TxSenderConfig {
    /// Hard ceiling on `gasFeeCap`, in wei.
    pub max_gas_fee_wei: u128,
    /// Percent fee bump applied on each replacement round.
    pub gas_growth_rate_percent: u32,
    /// How long a pending tx is given before it is replaced, in
    /// milliseconds.
    pub replacement_interval_ms: u64,
    /// Total time budget before a tx is declared unmineable, in
    /// milliseconds.
    pub max_waiting_time_ms: u64,
    /// Receipt poll interval, in milliseconds.
    pub confirmation_poll_interval_ms: u64,
}

impl TxSenderConfig {
    pub fn replacement_interval(&self) -> Duration {
        Duration::from_millis(self.replacement_interval_ms)
    }

    pub fn max_waiting_time(&self) -> Duration {
        Duration::from_millis(self.max_waiting_time_ms)
    }

    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_interval_ms)
    }

    pub fn for_tests() -> Self {
        Self {
            max_gas_fee_wei: 100_000_000_000,
            gas_growth_rate_percent: 50,
            replacement_interval_ms: 20_000,
            max_waiting_time_ms: 6 * 60 * 1_000,
            confirmation_poll_interval_ms: 3_000,
        }
    }
}
