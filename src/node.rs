//! Node registration gate checked before any task or API call runs.

use crate::contracts::node_manager::NodeManagerContract;
use crate::error::{ChainError, DaemonError};
use crate::provider::Provider;
use crate::registry::ContractName;
use alloy::primitives::Address;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// An unreachable execution client is reported as `ServiceUnavailable`.
pub async fn is_node_registered(provider: &Provider, node: Address) -> Result<bool, DaemonError> {
    let node_manager = NodeManagerContract::new(
        provider.contract_address(ContractName::RocketNodeManager)?,
        provider.client(),
    );
    node_manager
        .node_exists(node)
        .await
        .map_err(|source| match source {
            ChainError::Timeout(_) | ChainError::Transport(_) => {
                DaemonError::ServiceUnavailable(format!("execution client: {}", source))
            }
            source => DaemonError::NodeQuery {
                what: "check node registration",
                source,
            },
        })
}

/// Fails fast with `NotRegistered` unless the node account is registered.
pub async fn require_node_registered(provider: &Provider) -> Result<Address, DaemonError> {
    let node = provider.node_account()?.address();
    if is_node_registered(provider, node).await? {
        Ok(node)
    } else {
        Err(DaemonError::NotRegistered(node))
    }
}

/// Polls until the node is registered. Query failures are logged and retried
/// on the next poll; a missing wallet is returned immediately. Returns `None`
/// if cancelled first.
pub async fn wait_node_registered(
    provider: &Provider,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<Option<Address>, DaemonError> {
    let node = provider.node_account()?.address();

    loop {
        match is_node_registered(provider, node).await {
            Ok(true) => {
                info!(%node, "node is registered");
                return Ok(Some(node));
            }
            Ok(false) => info!(%node, "node is not registered yet, waiting"),
            Err(e) => warn!(%node, "could not check node registration: {}", e),
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}
