use super::{read, write_request};
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IRocketMinipool {
        function getStatus() external view returns (uint8);
        function getStatusBlock() external view returns (uint256);
        function getStatusTime() external view returns (uint256);
        function getDepositType() external view returns (uint8);
        function getNodeFee() external view returns (uint256);
        function getNodeDepositBalance() external view returns (uint256);
        function getNodeRefundBalance() external view returns (uint256);
        function getUserDepositBalance() external view returns (uint256);
        function dissolve() external;
        function withdraw() external;
    }
}

/// One deployed minipool. Not part of the registry: each position has its own
/// address and they all share this ABI.
#[derive(Clone)]
pub struct MinipoolContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl MinipoolContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn status(&self) -> Result<u8, ChainError> {
        read(self.client.as_ref(), self.address, IRocketMinipool::getStatusCall {}).await
    }

    pub async fn status_block(&self) -> Result<U256, ChainError> {
        read(self.client.as_ref(), self.address, IRocketMinipool::getStatusBlockCall {}).await
    }

    pub async fn status_time(&self) -> Result<U256, ChainError> {
        read(self.client.as_ref(), self.address, IRocketMinipool::getStatusTimeCall {}).await
    }

    pub async fn deposit_type(&self) -> Result<u8, ChainError> {
        read(self.client.as_ref(), self.address, IRocketMinipool::getDepositTypeCall {}).await
    }

    pub async fn node_fee(&self) -> Result<U256, ChainError> {
        read(self.client.as_ref(), self.address, IRocketMinipool::getNodeFeeCall {}).await
    }

    pub async fn node_deposit_balance(&self) -> Result<U256, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipool::getNodeDepositBalanceCall {},
        )
        .await
    }

    pub async fn node_refund_balance(&self) -> Result<U256, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipool::getNodeRefundBalanceCall {},
        )
        .await
    }

    pub async fn user_deposit_balance(&self) -> Result<U256, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipool::getUserDepositBalanceCall {},
        )
        .await
    }

    pub fn dissolve_request(&self) -> TransactionRequest {
        write_request(self.address, IRocketMinipool::dissolveCall {})
    }

    pub fn withdraw_request(&self) -> TransactionRequest {
        write_request(self.address, IRocketMinipool::withdrawCall {})
    }
}
