pub mod erc20;
pub mod minipool;
pub mod minipool_manager;
pub mod minipool_settings;
pub mod node_manager;
pub mod storage;

use crate::blockchain::ChainClient;
use crate::error::ChainError;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;

/// Runs a view call against `address` and decodes its return value.
pub(crate) async fn read<C: SolCall>(
    client: &dyn ChainClient,
    address: Address,
    call: C,
) -> Result<C::Return, ChainError> {
    let data: Vec<u8> = call.abi_encode();

    let result = client
        .call(TransactionRequest {
            to: Some(TxKind::Call(address)),
            input: TransactionInput::new(Bytes::from(data)),
            ..Default::default()
        })
        .await?;

    Ok(C::abi_decode_returns(&result)?)
}

/// Unsigned request invoking a state-changing method on `address`.
pub(crate) fn write_request<C: SolCall>(address: Address, call: C) -> TransactionRequest {
    TransactionRequest {
        to: Some(TxKind::Call(address)),
        input: TransactionInput::new(call.abi_encode().into()),
        ..Default::default()
    }
}
