//! `GetPoolContent`: fetches candidate tx lists from the L2 execution
//! engine's mempool via its `taiko_txPoolContent` JSON-RPC extension,
//! already pre-split into protocol-sized lists the way the engine's
//! modified miner package groups pending transactions.

use alloy_primitives::Address;
use alloy_provider::Provider;
use serde::{Deserialize, Serialize};

use crate::client::{L1Client, L2Client, ProtocolClient};
use crate::error::RpcError;

/// One candidate tx list, pre-built by the engine and already bounded by
/// the block gas/byte limits passed in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreBuiltTxList {
    #[serde(rename = "txListBytes")]
    pub tx_list_bytes: alloy_primitives::Bytes,
    #[serde(rename = "estimatedGasUsed")]
    pub estimated_gas_used: u64,
    #[serde(rename = "bytesLength")]
    pub bytes_length: u64,
}

pub async fn get_pool_content(
    protocol: &ProtocolClient,
    l1: &L1Client,
    l2: &L2Client,
    beneficiary: Address,
    block_max_gas_limit: u64,
    max_bytes_per_tx_list: u64,
    locals: &[Address],
    max_transactions_lists: u64,
) -> Result<Vec<PreBuiltTxList>, RpcError> {
    let l1_head = l1.header_by_number(None).await?;
    let l2_head = l2.header_by_number(None).await?;

    let basefee = protocol.get_basefee(l1_head.number, l2_head.gas_used as u32).await?;
    tracing::info!(%basefee, "current base fee");

    let locals_arg: Vec<String> = locals.iter().map(|a| a.to_checksum(None)).collect();

    l2.provider()
        .client()
        .request::<_, Vec<PreBuiltTxList>>(
            "taiko_txPoolContent",
            (
                beneficiary,
                basefee,
                block_max_gas_limit,
                max_bytes_per_tx_list,
                locals_arg,
                max_transactions_lists,
            ),
        )
        .await
        .map_err(|e| RpcError::L2Transport(e.to_string()))
}
