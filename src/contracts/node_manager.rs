use super::read;
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::Address;
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IRocketNodeManager {
        function getNodeExists(address nodeAddress) external view returns (bool);
    }
}

pub struct NodeManagerContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl NodeManagerContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub async fn node_exists(&self, node_address: Address) -> Result<bool, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketNodeManager::getNodeExistsCall { nodeAddress: node_address },
        )
        .await
    }
}
