use super::read;
use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{keccak256, Address, B256};
use alloy::sol;
use std::sync::Arc;

sol! {
    interface IRocketStorage {
        function getAddress(bytes32 key) external view returns (address);
    }
}

/// Storage key under which the network records a contract's address.
pub fn contract_address_key(name: &str) -> B256 {
    keccak256([b"contract.address".as_slice(), name.as_bytes()].concat())
}

/// Central key/value contract every other network contract is registered in.
pub struct StorageContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl StorageContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub async fn contract_address(&self, name: &str) -> Result<Address, ChainError> {
        let key = contract_address_key(name);
        read(self.client.as_ref(), self.address, IRocketStorage::getAddressCall { key }).await
    }
}
