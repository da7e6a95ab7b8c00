//! Thin ABI call/return (de)serialization for the handful of `TaikoL1`/
//! `TaikoL2` view functions the facade needs, built on the typed bindings
//! in `rollup_types::wire` instead of hand-rolled selector + offset math.

use alloy_primitives::{B256, U256};
use alloy_sol_types::SolCall;
use rollup_types::wire::{ITaikoL1, ITaikoL2, ITierProvider};
use rollup_types::{ProtocolState, TierDescriptor, TxListConfig};

use crate::error::RpcError;

pub fn get_state_variables_call() -> Vec<u8> {
    ITaikoL1::getStateVariablesCall {}.abi_encode()
}

pub fn decode_state_variables(data: &[u8]) -> Result<ProtocolState, RpcError> {
    let ret = ITaikoL1::getStateVariablesCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decode getStateVariables: {e}")))?;
    Ok(ProtocolState {
        genesis_height: ret.genesisHeight,
        num_blocks: ret.numBlocks,
        last_verified_block_id: ret.lastVerifiedBlockId,
        last_verified_at: ret.lastVerifiedAt,
    })
}

pub fn get_config_call() -> Vec<u8> {
    ITaikoL1::getConfigCall {}.abi_encode()
}

pub fn decode_config(data: &[u8]) -> Result<TxListConfig, RpcError> {
    let ret = ITaikoL1::getConfigCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decode getConfig: {e}")))?;
    Ok(TxListConfig {
        block_max_gas_limit: ret.blockMaxGasLimit,
        block_max_num_txs: ret.blockMaxNumTxs,
        block_max_tx_list_bytes: ret.blockMaxTxListBytes,
        min_tx_gas_limit: ret.minTxGasLimit,
        liveness_bond: ret.livenessBond.try_into().unwrap_or(u128::MAX),
    })
}

pub fn get_basefee_call(l1_height: u64, parent_gas_used: u32) -> Vec<u8> {
    ITaikoL2::getBasefeeCall { l1Height: l1_height, parentGasUsed: parent_gas_used }.abi_encode()
}

pub fn decode_basefee(data: &[u8]) -> Result<U256, RpcError> {
    let ret = ITaikoL2::getBasefeeCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decode getBasefee: {e}")))?;
    Ok(ret.basefee)
}

pub fn get_block_call(block_id: u64) -> Vec<u8> {
    ITaikoL1::getBlockCall { blockId: block_id }.abi_encode()
}

pub fn decode_block_hash(data: &[u8]) -> Result<B256, RpcError> {
    let ret = ITaikoL1::getBlockCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decode getBlock: {e}")))?;
    Ok(ret.blockHash)
}

pub fn get_tiers_call() -> Vec<u8> {
    ITierProvider::getTiersCall {}.abi_encode()
}

pub fn decode_tiers(data: &[u8]) -> Result<Vec<TierDescriptor>, RpcError> {
    let ret = ITierProvider::getTiersCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Other(anyhow::anyhow!("decode getTiers: {e}")))?;
    if ret.tiers.is_empty() {
        return Err(RpcError::EmptyTiersList);
    }
    Ok(ret.tiers.into_iter().map(Into::into).collect())
}
