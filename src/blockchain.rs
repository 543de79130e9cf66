use crate::error::ChainError;
use crate::transaction_monitor::{TransactionReceipt, TransactionStatus};
use alloy::consensus::TxEnvelope;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider as RpcProvider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Execution-client operations used by the daemon.
///
/// Implementations are shared by every task and API call at once, so they
/// must be safe for concurrent use.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError>;

    /// Transactions from `account` included in the latest block.
    async fn latest_nonce(&self, account: Address) -> Result<u64, ChainError>;

    /// Transactions from `account` including those still in the mempool.
    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError>;

    /// Read-only `eth_call`.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError>;

    /// Fills nonce, gas limit, fees and chain id so the request can be signed.
    async fn prepare(&self, tx: TransactionRequest) -> Result<TransactionRequest, ChainError>;

    /// Broadcasts a signed transaction and returns its hash once accepted.
    async fn broadcast(&self, tx: TxEnvelope) -> Result<B256, ChainError>;

    async fn transaction_receipt(&self, hash: B256)
        -> Result<Option<TransactionReceipt>, ChainError>;
}

/// [`ChainClient`] over an alloy HTTP provider. Every call is bounded by
/// `rpc_timeout`.
pub struct BlockchainClient {
    provider: Arc<dyn RpcProvider<Ethereum>>,
    chain_id: u64,
    rpc_timeout: Duration,
}

impl BlockchainClient {
    pub async fn new(rpc_url: &str, expected_chain_id: u64, rpc_timeout: Duration) -> Result<Self> {
        info!(rpc_url, "connecting to execution client");

        let url = Url::parse(rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url);

        let client = Self {
            provider: Arc::new(provider),
            chain_id: expected_chain_id,
            rpc_timeout,
        };

        let chain_id = client.chain_id().await?;
        if chain_id != expected_chain_id {
            return Err(anyhow::anyhow!(
                "Chain ID mismatch: expected {}, got {}",
                expected_chain_id,
                chain_id
            ));
        }

        info!(chain_id, "connected to execution client");
        Ok(client)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, alloy::transports::TransportError>>,
    {
        match tokio::time::timeout(self.rpc_timeout, fut).await {
            Ok(result) => result.map_err(ChainError::from),
            Err(_) => Err(ChainError::Timeout(self.rpc_timeout)),
        }
    }
}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.bounded(async { self.provider.get_chain_id().await })
            .await
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.bounded(async { self.provider.get_block_number().await })
            .await
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError> {
        self.bounded(async { self.provider.get_balance(account).await })
            .await
    }

    async fn latest_nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.bounded(async { self.provider.get_transaction_count(account).latest().await })
            .await
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.bounded(async { self.provider.get_transaction_count(account).pending().await })
            .await
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        self.bounded(async { self.provider.call(tx).await }).await
    }

    async fn prepare(&self, tx: TransactionRequest) -> Result<TransactionRequest, ChainError> {
        let from = tx
            .from
            .ok_or_else(|| ChainError::UnexpectedValue("transaction has no sender".into()))?;

        let nonce = self.pending_nonce(from).await?;
        let gas_limit = self
            .bounded(async { self.provider.estimate_gas(tx.clone()).await })
            .await?;
        let fees = self
            .bounded(async { self.provider.estimate_eip1559_fees().await })
            .await?;

        debug!(%from, nonce, gas_limit, "prepared transaction");

        Ok(tx
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas))
    }

    async fn broadcast(&self, tx: TxEnvelope) -> Result<B256, ChainError> {
        let pending = self
            .bounded(async { self.provider.send_tx_envelope(tx).await })
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        let receipt = self
            .bounded(async { self.provider.get_transaction_receipt(hash).await })
            .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };

        Ok(Some(TransactionReceipt {
            hash,
            block_number: included_block(hash, receipt.block_number)?,
            gas_used: U256::from(receipt.gas_used),
            status: if receipt.status() {
                TransactionStatus::Success
            } else {
                TransactionStatus::Failed
            },
        }))
    }
}

/// A receipt without a block number has not been mined.
fn included_block(hash: B256, block_number: Option<u64>) -> Result<u64, ChainError> {
    block_number.ok_or_else(|| {
        ChainError::UnexpectedValue(format!("receipt for {hash} has no block number"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_without_block_is_rejected() {
        let hash = B256::repeat_byte(0x01);
        assert_eq!(included_block(hash, Some(42)).unwrap(), 42);

        let err = included_block(hash, None).unwrap_err();
        assert!(matches!(err, ChainError::UnexpectedValue(_)));
        assert!(err.to_string().contains("no block number"));
    }
}
