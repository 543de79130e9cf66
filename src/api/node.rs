use crate::balance::check_sufficient;
use crate::error::DaemonError;
use crate::node::require_node_registered;
use crate::provider::Provider;
use crate::submitter::send;
use crate::units::Unit;
use alloy::primitives::{Address, B256, U256};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanSendFromNodeResponse {
    pub success: bool,
    pub insufficient_account_balance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFromNodeResponse {
    pub success: bool,
    pub tx_hash: B256,
}

/// Whether the node account could send `amount` of `unit`. A low balance is
/// reported in the response; a failed lookup is an error.
pub async fn can_send_from_node(
    provider: &Provider,
    amount: U256,
    unit: Unit,
) -> Result<CanSendFromNodeResponse, DaemonError> {
    let node = require_node_registered(provider).await?;
    let sufficient = check_sufficient(provider, node, unit, amount).await?;

    Ok(CanSendFromNodeResponse {
        success: sufficient,
        insufficient_account_balance: !sufficient,
    })
}

/// Sends `amount` of `unit` from the node account to `to`. Succeeds once the
/// transaction is accepted for broadcast.
pub async fn send_from_node(
    provider: &Provider,
    to: Address,
    amount: U256,
    unit: Unit,
) -> Result<SendFromNodeResponse, DaemonError> {
    require_node_registered(provider).await?;
    let account = provider.node_account()?;

    info!(%to, %amount, %unit, "sending from node account");
    let tx_hash = send(provider, account, to, unit, amount).await?;

    Ok(SendFromNodeResponse {
        success: true,
        tx_hash,
    })
}
