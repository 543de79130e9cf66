//! Per-node minipool enumeration and status collection.

use crate::contracts::minipool::MinipoolContract;
use crate::contracts::minipool_manager::MinipoolManagerContract;
use crate::error::{ChainError, DaemonError};
use crate::provider::Provider;
use crate::registry::ContractName;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Lifecycle status recorded by a minipool contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinipoolStatus {
    Initialized,
    Prelaunch,
    Staking,
    Withdrawable,
    Dissolved,
}

impl TryFrom<u8> for MinipoolStatus {
    type Error = ChainError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MinipoolStatus::Initialized),
            1 => Ok(MinipoolStatus::Prelaunch),
            2 => Ok(MinipoolStatus::Staking),
            3 => Ok(MinipoolStatus::Withdrawable),
            4 => Ok(MinipoolStatus::Dissolved),
            other => Err(ChainError::UnexpectedValue(format!(
                "unknown minipool status {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MinipoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MinipoolStatus::Initialized => "Initialized",
            MinipoolStatus::Prelaunch => "Prelaunch",
            MinipoolStatus::Staking => "Staking",
            MinipoolStatus::Withdrawable => "Withdrawable",
            MinipoolStatus::Dissolved => "Dissolved",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinipoolDetail {
    pub address: Address,
    pub status: MinipoolStatus,
    pub status_block: U256,
    pub status_time: U256,
    pub deposit_type: u8,
    pub node_fee: U256,
    pub node_deposit_balance: U256,
    pub node_refund_balance: U256,
    pub user_deposit_balance: U256,
}

/// Reads the current status of a single minipool.
pub async fn get_minipool_status(
    provider: &Provider,
    minipool: Address,
) -> Result<MinipoolStatus, DaemonError> {
    let contract = MinipoolContract::new(minipool, provider.client());
    contract
        .status()
        .await
        .and_then(MinipoolStatus::try_from)
        .map_err(|source| DaemonError::MinipoolQuery { minipool, source })
}

pub async fn get_minipool_detail(
    provider: &Provider,
    minipool: Address,
) -> Result<MinipoolDetail, DaemonError> {
    let contract = MinipoolContract::new(minipool, provider.client());

    let detail = async {
        let (
            status,
            status_block,
            status_time,
            deposit_type,
            node_fee,
            node_deposit_balance,
            node_refund_balance,
            user_deposit_balance,
        ) = tokio::try_join!(
            contract.status(),
            contract.status_block(),
            contract.status_time(),
            contract.deposit_type(),
            contract.node_fee(),
            contract.node_deposit_balance(),
            contract.node_refund_balance(),
            contract.user_deposit_balance(),
        )?;

        Ok::<_, ChainError>(MinipoolDetail {
            address: minipool,
            status: MinipoolStatus::try_from(status)?,
            status_block,
            status_time,
            deposit_type,
            node_fee,
            node_deposit_balance,
            node_refund_balance,
            user_deposit_balance,
        })
    };

    detail
        .await
        .map_err(|source| DaemonError::MinipoolQuery { minipool, source })
}

/// Minipool addresses belonging to `node`, in the manager's index order.
pub async fn get_node_minipool_addresses(
    provider: &Provider,
    node: Address,
) -> Result<Vec<Address>, DaemonError> {
    let manager = MinipoolManagerContract::new(
        provider.contract_address(ContractName::RocketMinipoolManager)?,
        provider.client(),
    );
    manager
        .node_minipools(node)
        .await
        .map_err(|source| DaemonError::NodeQuery {
            what: "enumerate node minipools",
            source,
        })
}

/// Details of every minipool owned by `node`, in the manager's index order.
///
/// A failure on any single minipool fails the whole call; a node without
/// minipools gets an empty list.
pub async fn get_node_minipool_details(
    provider: &Provider,
    node: Address,
) -> Result<Vec<MinipoolDetail>, DaemonError> {
    let addresses = get_node_minipool_addresses(provider, node).await?;
    debug!(%node, count = addresses.len(), "collecting minipool details");

    let mut details = Vec::with_capacity(addresses.len());
    for address in addresses {
        details.push(get_minipool_detail(provider, address).await?);
    }
    Ok(details)
}
