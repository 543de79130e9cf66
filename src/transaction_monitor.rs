use crate::blockchain::ChainClient;
use crate::error::DaemonError;
use alloy::primitives::{B256, U256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub hash: B256,
    pub block_number: u64,
    pub gas_used: U256,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatus {
    Success,
    Failed,
    Timeout,
}

pub struct TransactionMonitor {
    client: Arc<dyn ChainClient>,
    max_wait_time: Duration,
    poll_interval: Duration,
}

impl TransactionMonitor {
    pub fn new(client: Arc<dyn ChainClient>, max_wait_time: Duration, poll_interval: Duration) -> Self {
        Self {
            client,
            max_wait_time,
            poll_interval,
        }
    }

    pub async fn monitor_transaction(&self, tx_hash: B256) -> TransactionReceipt {
        debug!(%tx_hash, "monitoring transaction");

        let start_time = Instant::now();

        loop {
            if start_time.elapsed() > self.max_wait_time {
                warn!(%tx_hash, timeout = ?self.max_wait_time, "transaction monitoring timed out");
                return TransactionReceipt {
                    hash: tx_hash,
                    block_number: 0,
                    gas_used: U256::ZERO,
                    status: TransactionStatus::Timeout,
                };
            }

            match self.client.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    info!(%tx_hash, status = ?receipt.status, block = receipt.block_number, "transaction confirmed");
                    return receipt;
                }
                Ok(None) => {
                    debug!(%tx_hash, "transaction pending");
                }
                Err(e) => {
                    warn!(%tx_hash, "error checking transaction status: {}", e);
                }
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Waits for inclusion and turns anything other than success into an error.
    pub async fn wait_for_success(&self, tx_hash: B256) -> Result<TransactionReceipt, DaemonError> {
        let receipt = self.monitor_transaction(tx_hash).await;
        match receipt.status {
            TransactionStatus::Success => Ok(receipt),
            TransactionStatus::Failed => Err(DaemonError::TransactionReverted(tx_hash)),
            TransactionStatus::Timeout => Err(DaemonError::ConfirmationTimeout(tx_hash)),
        }
    }
}
