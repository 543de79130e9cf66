use super::read;
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IRocketMinipoolSettings {
        function getLaunchTimeout() external view returns (uint256);
    }
}

pub struct MinipoolSettingsContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl MinipoolSettingsContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    /// Number of blocks a prelaunch minipool may wait before it can be dissolved.
    pub async fn launch_timeout(&self) -> Result<U256, ChainError> {
        read(
            self.client.as_ref(),
            self.address,
            IRocketMinipoolSettings::getLaunchTimeoutCall {},
        )
        .await
    }
}
