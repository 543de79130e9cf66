//! Builds, signs and broadcasts node transactions.
//!
//! Submission is not idempotent: every call attempts a new broadcast. Callers
//! that must act at most once re-check chain state before calling again.

use crate::account::Account;
use crate::contracts::erc20::ERC20Contract;
use crate::error::{ChainError, DaemonError, SubmitCause, SubmitError, SubmitStage};
use crate::provider::Provider;
use crate::units::{DispatchPlan, Unit};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use tracing::{debug, info};

/// Prepares, signs and broadcasts `tx` from `account`. Returns once the
/// network has accepted the transaction, not when it is mined.
pub async fn submit(
    provider: &Provider,
    account: &Account,
    tx: TransactionRequest,
) -> Result<B256, SubmitError> {
    let client = provider.client();

    let prepared = client
        .prepare(tx.with_from(account.address()))
        .await
        .map_err(|e| SubmitError::new(SubmitStage::Construction, e))?;

    let signed = account
        .sign(prepared)
        .await
        .map_err(|e| SubmitError::new(SubmitStage::Signing, e))?;

    client
        .broadcast(signed)
        .await
        .map_err(|e| SubmitError::new(SubmitStage::Broadcast, e))
}

/// Whether `account` has broadcast transactions that are not yet mined.
///
/// Tasks check this before acting so a transaction that outlived its
/// confirmation wait is not sent a second time.
pub async fn has_transactions_in_flight(
    provider: &Provider,
    account: &Account,
) -> Result<bool, DaemonError> {
    let client = provider.client();
    let query = |source: ChainError| DaemonError::NodeQuery {
        what: "check pending transactions",
        source,
    };

    let pending = client.pending_nonce(account.address()).await.map_err(query)?;
    let latest = client.latest_nonce(account.address()).await.map_err(query)?;
    if pending > latest {
        debug!(node = %account.address(), pending, latest, "node has transactions in flight");
    }
    Ok(pending > latest)
}

/// Unsigned request moving `amount` of `unit` to `destination`.
pub fn transfer_request(
    provider: &Provider,
    destination: Address,
    unit: Unit,
    amount: U256,
) -> Result<TransactionRequest, SubmitError> {
    match unit.dispatch_plan() {
        DispatchPlan::Native => Ok(TransactionRequest::default()
            .with_to(destination)
            .with_value(amount)),
        DispatchPlan::Token { contract, .. } => {
            let address = provider.contract_address(contract).map_err(|_| {
                SubmitError::new(SubmitStage::Construction, SubmitCause::MissingContract(contract))
            })?;
            let token = ERC20Contract::new(address, provider.client());
            Ok(token.transfer_request(destination, amount))
        }
    }
}

/// Sends `amount` of `unit` from `account` to `destination`.
pub async fn send(
    provider: &Provider,
    account: &Account,
    destination: Address,
    unit: Unit,
    amount: U256,
) -> Result<B256, DaemonError> {
    let tx = transfer_request(provider, destination, unit, amount)
        .map_err(|source| DaemonError::Transfer { unit, source })?;

    let tx_hash = submit(provider, account, tx)
        .await
        .map_err(|source| DaemonError::Transfer { unit, source })?;

    if let DispatchPlan::Token { label, transfer_method, .. } = unit.dispatch_plan() {
        info!(%tx_hash, %destination, %amount, token = label, method = transfer_method, "token transfer broadcast");
    } else {
        info!(%tx_hash, %destination, %amount, "ETH transfer broadcast");
    }
    Ok(tx_hash)
}

/// Submits a contract call on behalf of a task, tagging failures with the
/// action and target contract.
pub async fn submit_action(
    provider: &Provider,
    account: &Account,
    action: &'static str,
    target: Address,
    tx: TransactionRequest,
) -> Result<B256, DaemonError> {
    let tx_hash = submit(provider, account, tx)
        .await
        .map_err(|source| DaemonError::Transaction {
            action,
            target,
            source,
        })?;
    info!(%tx_hash, %target, action, "transaction broadcast");
    Ok(tx_hash)
}
