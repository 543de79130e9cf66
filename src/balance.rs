//! Node account balance lookups per unit.

use crate::contracts::erc20::ERC20Contract;
use crate::error::DaemonError;
use crate::provider::Provider;
use crate::units::{DispatchPlan, Unit};
use alloy::primitives::{Address, U256};
use tracing::debug;

/// Current balance of `account` in `unit`, in wei.
pub async fn balance_of(
    provider: &Provider,
    account: Address,
    unit: Unit,
) -> Result<U256, DaemonError> {
    let balance = match unit.dispatch_plan() {
        DispatchPlan::Native => provider.client().native_balance(account).await,
        DispatchPlan::Token { contract, .. } => {
            let token = ERC20Contract::new(provider.contract_address(contract)?, provider.client());
            token.balance_of(account).await
        }
    };

    balance.map_err(|source| DaemonError::BalanceQuery { unit, source })
}

/// Whether `account` holds at least `amount` of `unit`.
///
/// `Ok(false)` means the balance is known to be too low; a failed lookup is
/// always an `Err`, never `false`.
pub async fn check_sufficient(
    provider: &Provider,
    account: Address,
    unit: Unit,
    amount: U256,
) -> Result<bool, DaemonError> {
    let balance = balance_of(provider, account, unit).await?;
    debug!(%account, %unit, %balance, %amount, "checked balance");
    Ok(balance >= amount)
}
