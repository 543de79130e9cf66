//! Symbolic contract names resolved to deployed addresses.

use crate::blockchain::ChainClient;
use crate::contracts::storage::StorageContract;
use crate::error::{ChainError, DaemonError};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Network contracts the daemon talks to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractName {
    #[serde(rename = "rocketETHToken")]
    RocketEthToken,
    #[serde(rename = "rocketPoolToken")]
    RocketPoolToken,
    #[serde(rename = "rocketNodeManager")]
    RocketNodeManager,
    #[serde(rename = "rocketMinipoolManager")]
    RocketMinipoolManager,
    #[serde(rename = "rocketMinipoolSettings")]
    RocketMinipoolSettings,
}

/// Which binding in `contracts` speaks a registered contract's ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAbi {
    Erc20,
    NodeManager,
    MinipoolManager,
    MinipoolSettings,
}

impl ContractName {
    pub const REQUIRED: [ContractName; 5] = [
        ContractName::RocketEthToken,
        ContractName::RocketPoolToken,
        ContractName::RocketNodeManager,
        ContractName::RocketMinipoolManager,
        ContractName::RocketMinipoolSettings,
    ];

    /// Name under which the storage contract records the address.
    pub fn storage_name(self) -> &'static str {
        match self {
            ContractName::RocketEthToken => "rocketETHToken",
            ContractName::RocketPoolToken => "rocketPoolToken",
            ContractName::RocketNodeManager => "rocketNodeManager",
            ContractName::RocketMinipoolManager => "rocketMinipoolManager",
            ContractName::RocketMinipoolSettings => "rocketMinipoolSettings",
        }
    }

    pub fn abi(self) -> ContractAbi {
        match self {
            ContractName::RocketEthToken | ContractName::RocketPoolToken => ContractAbi::Erc20,
            ContractName::RocketNodeManager => ContractAbi::NodeManager,
            ContractName::RocketMinipoolManager => ContractAbi::MinipoolManager,
            ContractName::RocketMinipoolSettings => ContractAbi::MinipoolSettings,
        }
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

impl FromStr for ContractName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractName::REQUIRED
            .into_iter()
            .find(|name| name.storage_name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown contract name: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractEntry {
    pub address: Address,
    pub abi: ContractAbi,
}

/// Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    entries: BTreeMap<ContractName, ContractEntry>,
}

impl ContractRegistry {
    /// Builds a registry from known addresses. Every required name must be
    /// present and non-zero.
    pub fn from_addresses(
        addresses: impl IntoIterator<Item = (ContractName, Address)>,
    ) -> Result<Self, DaemonError> {
        let entries: BTreeMap<_, _> = addresses
            .into_iter()
            .map(|(name, address)| {
                (
                    name,
                    ContractEntry {
                        address,
                        abi: name.abi(),
                    },
                )
            })
            .collect();

        for name in ContractName::REQUIRED {
            match entries.get(&name) {
                Some(entry) if entry.address != Address::ZERO => {}
                _ => return Err(DaemonError::MissingContract(name)),
            }
        }

        Ok(Self { entries })
    }

    /// Resolves every required name through the storage contract, except
    /// those pinned by `overrides`.
    pub async fn load(
        client: Arc<dyn ChainClient>,
        storage_address: Address,
        overrides: &BTreeMap<ContractName, Address>,
    ) -> Result<Self, DaemonError> {
        let storage = StorageContract::new(storage_address, client);
        let mut addresses = Vec::with_capacity(ContractName::REQUIRED.len());

        for name in ContractName::REQUIRED {
            let address = match overrides.get(&name) {
                Some(address) => {
                    debug!(contract = %name, %address, "using configured contract address");
                    *address
                }
                None => storage
                    .contract_address(name.storage_name())
                    .await
                    .map_err(|source: ChainError| DaemonError::NodeQuery {
                        what: "load contract address",
                        source,
                    })?,
            };
            addresses.push((name, address));
        }

        let registry = Self::from_addresses(addresses)?;
        info!(contracts = registry.entries.len(), "contract registry loaded");
        Ok(registry)
    }

    pub fn get(&self, name: ContractName) -> Result<ContractEntry, DaemonError> {
        self.entries
            .get(&name)
            .copied()
            .ok_or(DaemonError::MissingContract(name))
    }

    pub fn address(&self, name: ContractName) -> Result<Address, DaemonError> {
        self.get(name).map(|entry| entry.address)
    }
}
