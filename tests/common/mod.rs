#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use node_watchtower::contracts::erc20::IERC20;
use node_watchtower::contracts::minipool::IRocketMinipool;
use node_watchtower::contracts::minipool_manager::IRocketMinipoolManager;
use node_watchtower::contracts::minipool_settings::IRocketMinipoolSettings;
use node_watchtower::contracts::node_manager::IRocketNodeManager;
use node_watchtower::contracts::storage::{contract_address_key, IRocketStorage};
use node_watchtower::{
    Account, ChainClient, ChainError, ContractName, ContractRegistry, Provider,
    TransactionReceipt, TransactionStatus,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHAIN_ID: u64 = 1337;
pub const NODE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const STORAGE: Address = Address::new([0x5a; 20]);
pub const RETH_TOKEN: Address = Address::new([0x10; 20]);
pub const RPL_TOKEN: Address = Address::new([0x11; 20]);
pub const NODE_MANAGER: Address = Address::new([0x12; 20]);
pub const MINIPOOL_MANAGER: Address = Address::new([0x13; 20]);
pub const MINIPOOL_SETTINGS: Address = Address::new([0x14; 20]);

pub fn one_ether() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

pub fn ether(amount: u64) -> U256 {
    one_ether() * U256::from(amount)
}

pub fn node_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_str(NODE_KEY).unwrap()
}

pub fn node_address() -> Address {
    node_signer().address()
}

#[derive(Debug, Clone)]
pub struct MockMinipool {
    pub status: u8,
    pub status_block: U256,
    pub status_time: U256,
    pub deposit_type: u8,
    pub node_fee: U256,
    pub node_deposit_balance: U256,
    pub node_refund_balance: U256,
    pub user_deposit_balance: U256,
}

impl MockMinipool {
    pub fn with_status(status: u8, status_block: u64) -> Self {
        Self {
            status,
            status_block: U256::from(status_block),
            status_time: U256::from(1_600_000_000u64 + status_block * 12),
            deposit_type: 1,
            node_fee: U256::from(100_000_000_000_000_000u64),
            node_deposit_balance: ether(16),
            node_refund_balance: U256::ZERO,
            user_deposit_balance: ether(16),
        }
    }
}

/// Transaction seen by the mock's broadcast endpoint.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub hash: B256,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

#[derive(Debug, Default)]
struct MockState {
    block_number: u64,
    pending_nonce: u64,
    mined_nonce: u64,
    mined: HashSet<B256>,
    held: Vec<B256>,
    hold_transactions: bool,
    storage: HashMap<B256, Address>,
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    registered: HashSet<Address>,
    node_minipools: HashMap<Address, Vec<Address>>,
    minipools: HashMap<Address, MockMinipool>,
    failing_minipools: HashSet<Address>,
    launch_timeout: U256,
    broadcasts: Vec<Broadcast>,
    calls: usize,
    unreachable: bool,
    reject_broadcasts: bool,
    revert_receipts: bool,
}

/// In-memory execution client answering the daemon's contract calls.
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        let mut state = MockState {
            block_number: 10_000,
            launch_timeout: U256::from(5_760u64),
            ..Default::default()
        };
        for (name, address) in [
            (ContractName::RocketEthToken, RETH_TOKEN),
            (ContractName::RocketPoolToken, RPL_TOKEN),
            (ContractName::RocketNodeManager, NODE_MANAGER),
            (ContractName::RocketMinipoolManager, MINIPOOL_MANAGER),
            (ContractName::RocketMinipoolSettings, MINIPOOL_SETTINGS),
        ] {
            state
                .storage
                .insert(contract_address_key(name.storage_name()), address);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn register_node(&self, node: Address) {
        self.state.lock().unwrap().registered.insert(node);
    }

    pub fn unregister_contract(&self, name: ContractName) {
        self.state
            .lock()
            .unwrap()
            .storage
            .remove(&contract_address_key(name.storage_name()));
    }

    pub fn set_native_balance(&self, account: Address, balance: U256) {
        self.state.lock().unwrap().native.insert(account, balance);
    }

    pub fn set_token_balance(&self, token: Address, account: Address, balance: U256) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert((token, account), balance);
    }

    pub fn native_balance_of(&self, account: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .native
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    pub fn token_balance_of(&self, token: Address, account: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    pub fn add_minipool(&self, node: Address, minipool: Address, detail: MockMinipool) {
        let mut state = self.state.lock().unwrap();
        state.node_minipools.entry(node).or_default().push(minipool);
        state.minipools.insert(minipool, detail);
    }

    pub fn minipool(&self, minipool: Address) -> Option<MockMinipool> {
        self.state.lock().unwrap().minipools.get(&minipool).cloned()
    }

    pub fn fail_minipool(&self, minipool: Address) {
        self.state.lock().unwrap().failing_minipools.insert(minipool);
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn set_reject_broadcasts(&self, reject: bool) {
        self.state.lock().unwrap().reject_broadcasts = reject;
    }

    pub fn set_revert_receipts(&self, revert: bool) {
        self.state.lock().unwrap().revert_receipts = revert;
    }

    /// While set, broadcasts are accepted but never mined.
    pub fn set_hold_transactions(&self, hold: bool) {
        self.state.lock().unwrap().hold_transactions = hold;
    }

    /// Mines every held transaction.
    pub fn release_held(&self) {
        let mut state = self.state.lock().unwrap();
        state.hold_transactions = false;
        let held = std::mem::take(&mut state.held);
        for hash in held {
            let Some(tx) = state.broadcasts.iter().find(|b| b.hash == hash).cloned() else {
                continue;
            };
            if let Some(to) = tx.to {
                Self::apply(&mut state, node_address(), to, tx.value, &tx.input);
            }
            state.mined.insert(hash);
            state.mined_nonce += 1;
        }
    }

    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn check_reachable(&self) -> Result<(), ChainError> {
        if self.state.lock().unwrap().unreachable {
            Err(ChainError::Timeout(Duration::from_millis(1)))
        } else {
            Ok(())
        }
    }

    fn answer(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::UnexpectedValue("calldata too short".into()))?;
        let decode_err = |e: alloy::sol_types::Error| ChainError::Decode(e);

        if to == STORAGE && selector == IRocketStorage::getAddressCall::SELECTOR {
            let call = IRocketStorage::getAddressCall::abi_decode(data).map_err(decode_err)?;
            let address = state.storage.get(&call.key).copied().unwrap_or_default();
            return Ok(address.abi_encode());
        }

        if (to == RETH_TOKEN || to == RPL_TOKEN) && selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(data).map_err(decode_err)?;
            let balance = state
                .tokens
                .get(&(to, call.account))
                .copied()
                .unwrap_or_default();
            return Ok(balance.abi_encode());
        }

        if to == NODE_MANAGER && selector == IRocketNodeManager::getNodeExistsCall::SELECTOR {
            let call = IRocketNodeManager::getNodeExistsCall::abi_decode(data).map_err(decode_err)?;
            return Ok(state.registered.contains(&call.nodeAddress).abi_encode());
        }

        if to == MINIPOOL_MANAGER {
            if selector == IRocketMinipoolManager::getNodeMinipoolCountCall::SELECTOR {
                let call = IRocketMinipoolManager::getNodeMinipoolCountCall::abi_decode(data)
                    .map_err(decode_err)?;
                let count = state
                    .node_minipools
                    .get(&call.nodeAddress)
                    .map_or(0, Vec::len);
                return Ok(U256::from(count).abi_encode());
            }
            if selector == IRocketMinipoolManager::getNodeMinipoolAtCall::SELECTOR {
                let call = IRocketMinipoolManager::getNodeMinipoolAtCall::abi_decode(data)
                    .map_err(decode_err)?;
                let index = usize::try_from(call.index)
                    .map_err(|_| ChainError::UnexpectedValue("index out of range".into()))?;
                let minipool = state
                    .node_minipools
                    .get(&call.nodeAddress)
                    .and_then(|pools| pools.get(index))
                    .copied()
                    .ok_or_else(|| ChainError::UnexpectedValue("index out of range".into()))?;
                return Ok(minipool.abi_encode());
            }
        }

        if to == MINIPOOL_SETTINGS && selector == IRocketMinipoolSettings::getLaunchTimeoutCall::SELECTOR {
            return Ok(state.launch_timeout.abi_encode());
        }

        if state.failing_minipools.contains(&to) {
            return Err(ChainError::UnexpectedValue("execution reverted".into()));
        }

        if let Some(minipool) = state.minipools.get(&to) {
            let word = if selector == IRocketMinipool::getStatusCall::SELECTOR {
                U256::from(minipool.status)
            } else if selector == IRocketMinipool::getStatusBlockCall::SELECTOR {
                minipool.status_block
            } else if selector == IRocketMinipool::getStatusTimeCall::SELECTOR {
                minipool.status_time
            } else if selector == IRocketMinipool::getDepositTypeCall::SELECTOR {
                U256::from(minipool.deposit_type)
            } else if selector == IRocketMinipool::getNodeFeeCall::SELECTOR {
                minipool.node_fee
            } else if selector == IRocketMinipool::getNodeDepositBalanceCall::SELECTOR {
                minipool.node_deposit_balance
            } else if selector == IRocketMinipool::getNodeRefundBalanceCall::SELECTOR {
                minipool.node_refund_balance
            } else if selector == IRocketMinipool::getUserDepositBalanceCall::SELECTOR {
                minipool.user_deposit_balance
            } else {
                return Err(ChainError::UnexpectedValue("unknown minipool method".into()));
            };
            return Ok(word.abi_encode());
        }

        Err(ChainError::UnexpectedValue(format!("no contract at {}", to)))
    }

    /// Applies a broadcast transaction's effect on the mocked state.
    fn apply(state: &mut MockState, from: Address, to: Address, value: U256, input: &[u8]) {
        if !value.is_zero() {
            let sender = state.native.entry(from).or_default();
            *sender = sender.saturating_sub(value);
            *state.native.entry(to).or_default() += value;
        }

        if input.len() < 4 {
            return;
        }
        let selector: [u8; 4] = [input[0], input[1], input[2], input[3]];

        if selector == IERC20::transferCall::SELECTOR {
            if let Ok(call) = IERC20::transferCall::abi_decode(input) {
                let sender = state.tokens.entry((to, from)).or_default();
                *sender = sender.saturating_sub(call.amount);
                *state.tokens.entry((to, call.to)).or_default() += call.amount;
            }
        } else if selector == IRocketMinipool::withdrawCall::SELECTOR {
            // A withdrawn minipool is closed and leaves the node's list.
            for pools in state.node_minipools.values_mut() {
                pools.retain(|pool| *pool != to);
            }
            state.minipools.remove(&to);
        } else if selector == IRocketMinipool::dissolveCall::SELECTOR {
            if let Some(minipool) = state.minipools.get_mut(&to) {
                minipool.status = 4;
                minipool.status_block = U256::from(state.block_number);
            }
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.check_reachable()?;
        Ok(CHAIN_ID)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.check_reachable()?;
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError> {
        self.check_reachable()?;
        Ok(self.native_balance_of(account))
    }

    async fn latest_nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        Ok(if account == node_address() { state.mined_nonce } else { 0 })
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        Ok(if account == node_address() { state.pending_nonce } else { 0 })
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        self.check_reachable()?;
        let to = match tx.to {
            Some(TxKind::Call(to)) => to,
            _ => return Err(ChainError::UnexpectedValue("call without target".into())),
        };
        let data = tx.input.input().cloned().unwrap_or_default();
        self.answer(to, &data).map(Bytes::from)
    }

    async fn prepare(&self, tx: TransactionRequest) -> Result<TransactionRequest, ChainError> {
        self.check_reachable()?;
        if tx.from.is_none() {
            return Err(ChainError::UnexpectedValue("transaction has no sender".into()));
        }

        let nonce = self.state.lock().unwrap().pending_nonce;

        let mut tx = tx;
        tx.chain_id = Some(CHAIN_ID);
        tx.nonce = Some(nonce);
        tx.gas = Some(100_000);
        tx.max_fee_per_gas = Some(2_000_000_000);
        tx.max_priority_fee_per_gas = Some(1_000_000_000);
        Ok(tx)
    }

    async fn broadcast(&self, tx: TxEnvelope) -> Result<B256, ChainError> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        if state.reject_broadcasts {
            return Err(ChainError::UnexpectedValue("nonce too low".into()));
        }

        let hash = *tx.tx_hash();
        let to = tx.to();
        let value = tx.value();
        let input = tx.input().clone();

        state.pending_nonce += 1;
        if state.hold_transactions {
            state.held.push(hash);
        } else {
            if let Some(to) = to {
                Self::apply(&mut state, node_address(), to, value, &input);
            }
            state.mined.insert(hash);
            state.mined_nonce += 1;
        }
        state.broadcasts.push(Broadcast {
            hash,
            to,
            value,
            input,
        });
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        if !state.mined.contains(&hash) {
            return Ok(None);
        }
        Ok(Some(TransactionReceipt {
            hash,
            block_number: state.block_number,
            gas_used: U256::from(21_000u64),
            status: if state.revert_receipts {
                TransactionStatus::Failed
            } else {
                TransactionStatus::Success
            },
        }))
    }
}

/// Provider over `chain` whose registry is loaded through the storage contract.
pub async fn provider_with(chain: Arc<MockChain>, with_wallet: bool) -> Provider {
    let client: Arc<dyn ChainClient> = chain;
    let registry = ContractRegistry::load(client.clone(), STORAGE, &BTreeMap::new())
        .await
        .unwrap();
    let account = with_wallet.then(|| Account::from_signer(node_signer()));
    Provider::new(account, client, registry)
}

/// A registered node with a wallet, ready for API and task calls.
pub async fn registered_node() -> (Arc<MockChain>, Provider) {
    let chain = Arc::new(MockChain::new());
    chain.register_node(node_address());
    let provider = provider_with(chain.clone(), true).await;
    (chain, provider)
}
