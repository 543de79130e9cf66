use super::{read, write_request};
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Token contract used for the rETH and RPL units.
#[derive(Clone)]
pub struct ERC20Contract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl ERC20Contract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, ChainError> {
        read(self.client.as_ref(), self.address, IERC20::balanceOfCall { account }).await
    }

    pub fn transfer_request(&self, to: Address, amount: U256) -> TransactionRequest {
        write_request(self.address, IERC20::transferCall { to, amount })
    }
}
