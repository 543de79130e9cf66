//! Transferable asset units and how each one is moved on chain.

use crate::error::DaemonError;
use crate::registry::ContractName;
use alloy::primitives::utils::parse_ether;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset kinds a node account can hold and send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Native coin.
    #[serde(rename = "ETH")]
    Eth,
    /// Staking-derivative token.
    #[serde(rename = "RETH")]
    Reth,
    /// Governance token.
    #[serde(rename = "RPL")]
    Rpl,
}

/// How a transfer or balance lookup for a unit is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPlan {
    Native,
    Token {
        contract: ContractName,
        label: &'static str,
        transfer_method: &'static str,
    },
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Eth, Unit::Reth, Unit::Rpl];

    pub fn dispatch_plan(self) -> DispatchPlan {
        match self {
            Unit::Eth => DispatchPlan::Native,
            Unit::Reth => DispatchPlan::Token {
                contract: ContractName::RocketEthToken,
                label: "rETH",
                transfer_method: "transfer",
            },
            Unit::Rpl => DispatchPlan::Token {
                contract: ContractName::RocketPoolToken,
                label: "RPL",
                transfer_method: "transfer",
            },
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Eth => "ETH",
            Unit::Reth => "RETH",
            Unit::Rpl => "RPL",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETH" => Ok(Unit::Eth),
            "RETH" => Ok(Unit::Reth),
            "RPL" => Ok(Unit::Rpl),
            _ => Err(DaemonError::UnknownUnit(s.to_string())),
        }
    }
}

/// Parses an operator-supplied amount into wei without going through floats.
///
/// With `in_wei` the string must be a plain integer; otherwise it is read as a
/// decimal amount of whole units (all units use 18 decimals).
pub fn parse_amount(amount: &str, in_wei: bool) -> anyhow::Result<U256> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(anyhow::anyhow!("Amount cannot be negative: {}", amount));
    }
    if in_wei {
        return U256::from_str_radix(amount, 10)
            .map_err(|e| anyhow::anyhow!("Invalid wei amount {}: {}", amount, e));
    }
    parse_ether(amount).map_err(|e| anyhow::anyhow!("Invalid amount {}: {}", amount, e))
}
