use super::Confirmation;
use crate::account::Account;
use crate::contracts::minipool::MinipoolContract;
use crate::contracts::minipool_settings::MinipoolSettingsContract;
use crate::error::DaemonError;
use crate::minipool::{get_minipool_status, get_node_minipool_addresses, MinipoolStatus};
use crate::provider::Provider;
use crate::registry::ContractName;
use crate::scheduler::Task;
use crate::submitter::{has_transactions_in_flight, submit_action};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Dissolves prelaunch minipools that missed their launch window.
pub struct DissolveTimedOutMinipoolsJob {
    confirmation: Confirmation,
}

/// A prelaunch minipool times out once `launch_timeout` blocks have passed
/// since it entered prelaunch.
pub fn is_launch_timed_out(status_block: U256, launch_timeout: U256, current_block: u64) -> bool {
    status_block.saturating_add(launch_timeout) <= U256::from(current_block)
}

impl DissolveTimedOutMinipoolsJob {
    pub fn new(confirmation: Confirmation) -> Self {
        Self { confirmation }
    }

    async fn process_minipool(
        &self,
        provider: &Provider,
        account: &Account,
        minipool: Address,
        launch_timeout: U256,
        current_block: u64,
    ) -> Result<bool, DaemonError> {
        let status = get_minipool_status(provider, minipool).await?;
        if status != MinipoolStatus::Prelaunch {
            return Ok(false);
        }

        let contract = MinipoolContract::new(minipool, provider.client());
        let status_block = contract
            .status_block()
            .await
            .map_err(|source| DaemonError::MinipoolQuery { minipool, source })?;

        if !is_launch_timed_out(status_block, launch_timeout, current_block) {
            debug!(%minipool, %status_block, current_block, "prelaunch minipool still within launch window");
            return Ok(false);
        }

        if has_transactions_in_flight(provider, account).await? {
            info!(%minipool, "node transaction still in flight, skipping dissolve");
            return Ok(false);
        }

        info!(%minipool, %status_block, current_block, "prelaunch minipool timed out, dissolving");
        let tx_hash = submit_action(
            provider,
            account,
            "dissolve",
            minipool,
            contract.dissolve_request(),
        )
        .await?;

        let receipt = self
            .confirmation
            .monitor(provider)
            .wait_for_success(tx_hash)
            .await?;
        info!(%minipool, %tx_hash, block = receipt.block_number, "minipool dissolve confirmed");
        Ok(true)
    }
}

#[async_trait]
impl Task for DissolveTimedOutMinipoolsJob {
    fn name(&self) -> &'static str {
        "dissolve-timed-out-minipools"
    }

    async fn run_cycle(&self, provider: &Provider) -> Result<(), DaemonError> {
        let account = provider.node_account()?;
        let minipools = get_node_minipool_addresses(provider, account.address()).await?;
        if minipools.is_empty() {
            return Ok(());
        }

        let settings = MinipoolSettingsContract::new(
            provider.contract_address(ContractName::RocketMinipoolSettings)?,
            provider.client(),
        );
        let launch_timeout = settings
            .launch_timeout()
            .await
            .map_err(|source| DaemonError::NodeQuery {
                what: "read minipool launch timeout",
                source,
            })?;
        let current_block = provider
            .client()
            .block_number()
            .await
            .map_err(|source| DaemonError::NodeQuery {
                what: "read current block",
                source,
            })?;

        let mut first_error = None;
        for minipool in minipools {
            if let Err(e) = self
                .process_minipool(provider, account, minipool, launch_timeout, current_block)
                .await
            {
                warn!(%minipool, "could not dissolve minipool: {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_timeout_boundary() {
        let status_block = U256::from(1_000u64);
        let timeout = U256::from(5_760u64);
        assert!(!is_launch_timed_out(status_block, timeout, 6_759));
        assert!(is_launch_timed_out(status_block, timeout, 6_760));
        assert!(is_launch_timed_out(status_block, timeout, 10_000));
    }

    #[test]
    fn test_launch_timeout_does_not_overflow() {
        assert!(!is_launch_timed_out(U256::MAX, U256::from(1u64), u64::MAX));
    }
}
