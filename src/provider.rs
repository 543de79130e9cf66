//! Shared bundle of node account, chain client and contract registry.

use crate::account::Account;
use crate::blockchain::{BlockchainClient, ChainClient};
use crate::config::ChainConfig;
use crate::error::DaemonError;
use crate::registry::{ContractName, ContractRegistry};
use crate::retry::{execute_with_retry, RetryConfig};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the core components need to talk to the network.
///
/// Built once at startup and only read afterwards, so one `Arc<Provider>` is
/// shared by every task and API call.
pub struct Provider {
    account: Option<Account>,
    client: Arc<dyn ChainClient>,
    registry: ContractRegistry,
}

impl Provider {
    pub fn new(
        account: Option<Account>,
        client: Arc<dyn ChainClient>,
        registry: ContractRegistry,
    ) -> Self {
        Self {
            account,
            client,
            registry,
        }
    }

    /// Connects to the execution client, unlocks the wallet and loads the
    /// registry, retrying the network steps per `[retry]`.
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let retry_config = RetryConfig::from_settings(&config.retry);

        let client = execute_with_retry(
            || {
                let rpc_url = config.chain.execution_http_url.clone();
                let chain_id = config.chain.chain_id;
                let rpc_timeout = config.rpc_timeout();
                async move { BlockchainClient::new(&rpc_url, chain_id, rpc_timeout).await }
            },
            &retry_config,
            "Execution client connection",
        )
        .await
        .context("could not connect to the execution client")?;
        let client: Arc<dyn ChainClient> = Arc::new(client);

        let account = Account::from_config(config).await?;
        if account.is_none() {
            warn!("no node wallet configured; transactions and node queries will be unavailable");
        }

        let storage_address = config.storage_address()?;
        let overrides = config.contract_overrides()?;
        let registry = execute_with_retry(
            || {
                let client = client.clone();
                let overrides = &overrides;
                async move { ContractRegistry::load(client, storage_address, overrides).await }
            },
            &retry_config,
            "Contract registry load",
        )
        .await
        .context("could not load the contract registry")?;

        info!("provider ready");
        Ok(Self::new(account, client, registry))
    }

    /// The unlocked node account, or `WalletUnavailable`.
    pub fn node_account(&self) -> Result<&Account, DaemonError> {
        self.account.as_ref().ok_or(DaemonError::WalletUnavailable)
    }

    pub fn client(&self) -> Arc<dyn ChainClient> {
        self.client.clone()
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn contract_address(&self, name: ContractName) -> Result<Address, DaemonError> {
        self.registry.address(name)
    }
}
