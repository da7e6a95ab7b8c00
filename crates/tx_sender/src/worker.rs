//! One worker task per sender account (§4.6 "Internals"). Holds the
//! account's current nonce and processes queued transactions strictly in
//! order: a transaction is only submitted once its predecessor has been
//! confirmed, replaced away, or declared unmineable, so nonce assignment
//! never has to reconcile two in-flight sends at once. This is the
//! simplest implementation of the spec's ordering guarantee ("confirmation
//! deliveries follow nonce order per sender") and its nonce-gap handling
//! ("the worker holds later txs until the predecessor resolves").

use std::time::{Duration, Instant};

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, Signature, TxKind, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use rollup_config::TxSenderConfig;
use rollup_rpc::L1Client;
use tokio::sync::{mpsc, oneshot};

use crate::error::SendError;
use crate::types::{Confirmation, Outcome, TxId, UnsignedTx};

pub(crate) struct SendRequest {
    pub tx: UnsignedTx,
    pub tx_id: TxId,
    pub confirm: oneshot::Sender<Confirmation>,
}

pub(crate) async fn run(
    mut inbox: mpsc::UnboundedReceiver<SendRequest>,
    l1: L1Client,
    signer: PrivateKeySigner,
    chain_id: u64,
    config: TxSenderConfig,
) {
    let address = signer.address();
    let mut nonce = match l1.provider().get_transaction_count(address).await {
        Ok(n) => n,
        Err(err) => {
            tracing::error!(%err, "tx sender worker could not read starting nonce, shutting down");
            return;
        }
    };

    while let Some(request) = inbox.recv().await {
        nonce = process_one(&l1, &signer, chain_id, &config, nonce, request).await;
    }

    tracing::info!(%address, "tx sender worker inbox closed, shutting down");
}

/// Drives one queued transaction from first submission through to a
/// terminal outcome, returning the nonce the next transaction should use.
async fn process_one(
    l1: &L1Client,
    signer: &PrivateKeySigner,
    chain_id: u64,
    config: &TxSenderConfig,
    mut nonce: u64,
    request: SendRequest,
) -> u64 {
    let SendRequest { tx, tx_id, confirm } = request;

    let (mut fee_cap, mut tip_cap) = match resolve_fees(l1, &tx, config).await {
        Ok(fees) => fees,
        Err(err) => {
            tracing::warn!(%err, "could not resolve fees for new transaction, using configured max");
            (config.max_gas_fee_wei, config.max_gas_fee_wei / 2)
        }
    };

    let started = Instant::now();
    let mut envelope = match sign(signer, chain_id, nonce, &tx, fee_cap, tip_cap) {
        Ok(e) => e,
        Err(err) => {
            tracing::error!(%err, "failed to sign transaction, abandoning");
            let _ = confirm.send(Confirmation {
                tx_id,
                nonce,
                final_tx_hash: Default::default(),
                outcome: Outcome::Unmineable,
            });
            return nonce + 1;
        }
    };

    if let Err(err) = submit(l1, &envelope).await {
        if is_nonce_too_low(&err) {
            tracing::info!(nonce, "nonce too low on submission, resyncing from chain");
            nonce = l1.provider().get_transaction_count(signer.address()).await.unwrap_or(nonce + 1);
            let _ = confirm.send(Confirmation {
                tx_id,
                nonce,
                final_tx_hash: *envelope.tx_hash(),
                outcome: Outcome::NonceTooLow,
            });
            return nonce;
        }
        tracing::warn!(%err, "initial submission failed, will still attempt replacement cycle");
    }

    let mut deadline = started + config.replacement_interval();
    let mut poll = tokio::time::interval(config.confirmation_poll_interval());
    poll.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match l1.provider().get_transaction_receipt(*envelope.tx_hash()).await {
                    Ok(Some(receipt)) => {
                        let outcome = if receipt.status() {
                            Outcome::Success {
                                block_number: receipt.block_number.unwrap_or_default(),
                                gas_used: receipt.gas_used as u64,
                            }
                        } else {
                            let reason = recover_revert_reason(
                                l1,
                                signer.address(),
                                tx.to,
                                tx.data.clone(),
                                receipt.block_number,
                            )
                            .await;
                            Outcome::Reverted { reason }
                        };
                        let _ = confirm.send(Confirmation {
                            tx_id,
                            nonce,
                            final_tx_hash: *envelope.tx_hash(),
                            outcome,
                        });
                        return nonce + 1;
                    }
                    Ok(None) => {}
                    Err(err) => tracing::warn!(%err, "receipt poll failed, will retry"),
                }
            }
            _ = tokio::time::sleep_until(deadline.into()) => {
                if started.elapsed() >= config.max_waiting_time() {
                    tracing::warn!(nonce, elapsed = ?started.elapsed(), "transaction unmineable, self-cancelling to release nonce");
                    self_cancel(l1, signer, chain_id, nonce, config.max_gas_fee_wei).await;
                    let _ = confirm.send(Confirmation {
                        tx_id,
                        nonce,
                        final_tx_hash: *envelope.tx_hash(),
                        outcome: Outcome::Unmineable,
                    });
                    return nonce + 1;
                }

                let bumped_cap = bump(fee_cap, config.gas_growth_rate_percent).min(config.max_gas_fee_wei);
                let bumped_tip = bump(tip_cap, config.gas_growth_rate_percent).min(bumped_cap);
                fee_cap = bumped_cap;
                tip_cap = bumped_tip;

                match sign(signer, chain_id, nonce, &tx, fee_cap, tip_cap) {
                    Ok(new_envelope) => {
                        if let Err(err) = submit(l1, &new_envelope).await {
                            tracing::warn!(%err, "fee-bumped replacement failed to submit");
                        } else {
                            tracing::info!(nonce, fee_cap, tip_cap, "replaced transaction with bumped fees");
                        }
                        envelope = new_envelope;
                    }
                    Err(err) => tracing::error!(%err, "could not re-sign replacement"),
                }
                deadline = Instant::now() + config.replacement_interval();
            }
        }
    }
}

/// Mined receipts carry no revert return data, so the revert reason is
/// recovered the standard way: replay the same call via `eth_call` at the
/// block it reverted in and decode whatever error message comes back
/// through the protocol's custom-error selector table.
async fn recover_revert_reason(
    l1: &L1Client,
    from: Address,
    to: Address,
    data: Bytes,
    block_number: Option<u64>,
) -> String {
    let request = TransactionRequest::default().from(from).to(to).input(data.into());
    let call = l1.provider().call(&request);
    let result = match block_number {
        Some(bn) => call.block_id(bn.into()).await,
        None => call.await,
    };

    match result {
        Ok(_) => "reverted on-chain with no decodable reason (replay succeeded)".to_string(),
        Err(err) => rollup_rpc::decode_contract_error(&err.to_string()),
    }
}

async fn resolve_fees(
    l1: &L1Client,
    tx: &UnsignedTx,
    config: &TxSenderConfig,
) -> Result<(u128, u128), SendError> {
    if let (Some(cap), Some(tip)) = (tx.gas_fee_cap, tx.gas_tip_cap) {
        return Ok((cap.min(config.max_gas_fee_wei), tip));
    }

    let estimate = l1
        .provider()
        .estimate_eip1559_fees(None)
        .await
        .map_err(|e| SendError::Rpc(anyhow::anyhow!("estimating fees: {e}")))?;

    let tip = tx.gas_tip_cap.unwrap_or(estimate.max_priority_fee_per_gas);
    let cap = tx
        .gas_fee_cap
        .unwrap_or(estimate.max_fee_per_gas)
        .min(config.max_gas_fee_wei);
    Ok((cap, tip))
}

fn bump(value: u128, percent: u32) -> u128 {
    value.saturating_mul(100 + percent as u128) / 100
}

fn sign(
    signer: &PrivateKeySigner,
    chain_id: u64,
    nonce: u64,
    tx: &UnsignedTx,
    fee_cap: u128,
    tip_cap: u128,
) -> Result<TxEnvelope, SendError> {
    let mut unsigned = TxEip1559 {
        chain_id,
        nonce,
        gas_limit: tx.gas_limit,
        max_fee_per_gas: fee_cap,
        max_priority_fee_per_gas: tip_cap,
        to: TxKind::Call(tx.to),
        value: tx.value,
        access_list: Default::default(),
        input: tx.data.clone(),
    };
    let signature: Signature = signer
        .sign_transaction_sync(&mut unsigned)
        .map_err(|e| SendError::Rpc(anyhow::anyhow!("signing transaction: {e}")))?;
    Ok(TxEnvelope::Eip1559(unsigned.into_signed(signature)))
}

async fn submit(l1: &L1Client, envelope: &TxEnvelope) -> Result<(), SendError> {
    use alloy_eips::eip2718::Encodable2718;
    let raw = envelope.encoded_2718();
    l1.provider()
        .send_raw_transaction(&raw)
        .await
        .map(|_| ())
        .map_err(|e| SendError::Rpc(anyhow::anyhow!("broadcasting transaction: {e}")))
}

fn is_nonce_too_low(err: &SendError) -> bool {
    err.to_string().to_lowercase().contains("nonce too low")
}

/// Sends a zero-value self-transfer at `nonce` with `cap` as both fee cap
/// and tip, to consume the nonce without moving any funds, freeing the
/// worker to move on to the next queued transaction (§4.6 "Replacement").
async fn self_cancel(l1: &L1Client, signer: &PrivateKeySigner, chain_id: u64, nonce: u64, cap: u128) {
    let cancel_tx = UnsignedTx {
        to: signer.address(),
        value: U256::ZERO,
        data: Default::default(),
        gas_limit: 21_000,
        gas_fee_cap: Some(cap),
        gas_tip_cap: Some(cap),
    };
    match sign(signer, chain_id, nonce, &cancel_tx, cap, cap) {
        Ok(envelope) => {
            if let Err(err) = submit(l1, &envelope).await {
                tracing::warn!(%err, nonce, "self-cancel transaction failed to submit");
            }
        }
        Err(err) => tracing::error!(%err, nonce, "failed to sign self-cancel transaction"),
    }
}
