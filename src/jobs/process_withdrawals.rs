use super::Confirmation;
use crate::account::Account;
use crate::contracts::minipool::MinipoolContract;
use crate::error::DaemonError;
use crate::minipool::{get_minipool_status, get_node_minipool_addresses, MinipoolStatus};
use crate::provider::Provider;
use crate::scheduler::Task;
use crate::submitter::{has_transactions_in_flight, submit_action};
use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Withdraws node balances from minipools the network has marked withdrawable.
pub struct ProcessWithdrawalsJob {
    confirmation: Confirmation,
}

impl ProcessWithdrawalsJob {
    pub fn new(confirmation: Confirmation) -> Self {
        Self { confirmation }
    }

    async fn process_minipool(
        &self,
        provider: &Provider,
        account: &Account,
        minipool: Address,
    ) -> Result<bool, DaemonError> {
        // Re-read on every cycle; a withdrawn minipool no longer reports Withdrawable.
        let status = get_minipool_status(provider, minipool).await?;
        if status != MinipoolStatus::Withdrawable {
            debug!(%minipool, %status, "minipool not withdrawable");
            return Ok(false);
        }

        if has_transactions_in_flight(provider, account).await? {
            info!(%minipool, "node transaction still in flight, skipping withdrawal");
            return Ok(false);
        }

        info!(%minipool, "minipool is withdrawable, withdrawing");
        let contract = MinipoolContract::new(minipool, provider.client());
        let tx_hash = submit_action(
            provider,
            account,
            "withdraw",
            minipool,
            contract.withdraw_request(),
        )
        .await?;

        let receipt = self
            .confirmation
            .monitor(provider)
            .wait_for_success(tx_hash)
            .await?;
        info!(%minipool, %tx_hash, block = receipt.block_number, "minipool withdrawal confirmed");
        Ok(true)
    }
}

#[async_trait]
impl Task for ProcessWithdrawalsJob {
    fn name(&self) -> &'static str {
        "process-withdrawals"
    }

    async fn run_cycle(&self, provider: &Provider) -> Result<(), DaemonError> {
        let account = provider.node_account()?;
        let minipools = get_node_minipool_addresses(provider, account.address()).await?;

        let mut processed = 0usize;
        let mut first_error = None;
        for minipool in minipools {
            match self.process_minipool(provider, account, minipool).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%minipool, "could not process withdrawal: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if processed > 0 {
            info!(processed, "processed minipool withdrawals");
        }
        first_error.map_or(Ok(()), Err)
    }
}
