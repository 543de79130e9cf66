use super::read;
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IRocketMinipoolManager {
        function getNodeMinipoolCount(address nodeAddress) external view returns (uint256);
        function getNodeMinipoolAt(address nodeAddress, uint256 index) external view returns (address);
    }
}

pub struct MinipoolManagerContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl MinipoolManagerContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub async fn node_minipool_count(&self, node_address: Address) -> Result<U256, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipoolManager::getNodeMinipoolCountCall { nodeAddress: node_address },
        )
        .await
    }

    pub async fn node_minipool_at(
        &self,
        node_address: Address,
        index: U256,
    ) -> Result<Address, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipoolManager::getNodeMinipoolAtCall {
                nodeAddress: node_address,
                index,
            },
        )
        .await
    }

    /// Minipool addresses for a node, in the manager's index order.
    pub async fn node_minipools(&self, node_address: Address) -> Result<Vec<Address>, ChainError> {
        let count = self.node_minipool_count(node_address).await?;
        let count: u64 = count.try_into().map_err(|_| {
            ChainError::UnexpectedValue(format!("minipool count {} out of range", count))
        })?;

        let mut addresses = Vec::with_capacity(count as usize);
        for index in 0..count {
            addresses.push(self.node_minipool_at(node_address, U256::from(index)).await?);
        }
        Ok(addresses)
    }
}
