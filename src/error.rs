use crate::registry::ContractName;
use crate::units::Unit;
use alloy::network::{Ethereum, TransactionBuilderError};
use alloy::primitives::{Address, B256};
use alloy::transports::TransportError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the execution client.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),

    #[error("rpc transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode contract return data: {0}")]
    Decode(#[from] alloy::sol_types::Error),

    #[error("unexpected value returned by chain: {0}")]
    UnexpectedValue(String),
}

impl ChainError {
    /// Failures that may clear up on their own when the call is repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Timeout(_) | ChainError::Transport(_))
    }
}

/// Where in the submission pipeline a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    Construction,
    Signing,
    Broadcast,
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            SubmitStage::Construction => "construction",
            SubmitStage::Signing => "signing",
            SubmitStage::Broadcast => "broadcast",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, Error)]
pub enum SubmitCause {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Signer(#[from] TransactionBuilderError<Ethereum>),

    #[error("contract {0} is not in the registry")]
    MissingContract(ContractName),
}

/// A transaction that could not be handed to the network.
#[derive(Debug, Error)]
#[error("transaction failed at {stage}: {cause}")]
pub struct SubmitError {
    pub stage: SubmitStage,
    #[source]
    pub cause: SubmitCause,
}

impl SubmitError {
    pub fn new(stage: SubmitStage, cause: impl Into<SubmitCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("node {0} is not registered with the protocol")]
    NotRegistered(Address),

    #[error("node wallet is not available (no private key or KMS key configured)")]
    WalletUnavailable,

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("unknown unit '{0}', expected one of ETH, RETH, RPL")]
    UnknownUnit(String),

    #[error("contract {0} is not in the registry")]
    MissingContract(ContractName),

    #[error("could not retrieve node account {unit} balance: {source}")]
    BalanceQuery {
        unit: Unit,
        #[source]
        source: ChainError,
    },

    #[error("could not query minipool {minipool}: {source}")]
    MinipoolQuery {
        minipool: Address,
        #[source]
        source: ChainError,
    },

    #[error("could not {what}: {source}")]
    NodeQuery {
        what: &'static str,
        #[source]
        source: ChainError,
    },

    #[error("could not transfer {unit}: {source}")]
    Transfer {
        unit: Unit,
        #[source]
        source: SubmitError,
    },

    #[error("could not submit {action} for {target}: {source}")]
    Transaction {
        action: &'static str,
        target: Address,
        #[source]
        source: SubmitError,
    },

    #[error("transaction {0} reverted")]
    TransactionReverted(B256),

    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(B256),
}

impl DaemonError {
    /// Errors that must be surfaced immediately and never retried.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DaemonError::NotRegistered(_)
                | DaemonError::WalletUnavailable
                | DaemonError::ServiceUnavailable(_)
                | DaemonError::UnknownUnit(_)
        )
    }

    /// Only transient chain query failures are worth repeating. Preconditions,
    /// registry misses and anything involving a submitted transaction are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            DaemonError::BalanceQuery { source, .. }
            | DaemonError::MinipoolQuery { source, .. }
            | DaemonError::NodeQuery { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// The submission stage for transaction failures, if any.
    pub fn submit_stage(&self) -> Option<SubmitStage> {
        match self {
            DaemonError::Transfer { source, .. } | DaemonError::Transaction { source, .. } => {
                Some(source.stage)
            }
            _ => None,
        }
    }
}
