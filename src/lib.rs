pub mod account;
pub mod api;
pub mod balance;
pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod jobs;
pub mod kms_signer;
pub mod minipool;
pub mod node;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod submitter;
pub mod transaction_monitor;
pub mod units;

pub use account::Account;
pub use blockchain::{BlockchainClient, ChainClient};
pub use config::ChainConfig;
pub use error::{ChainError, DaemonError, SubmitError, SubmitStage};
pub use jobs::{Confirmation, DissolveTimedOutMinipoolsJob, ProcessWithdrawalsJob};
pub use provider::Provider;
pub use registry::{ContractName, ContractRegistry};
pub use retry::{execute_with_retry, RetryConfig, Retryable};
pub use scheduler::{Scheduler, SchedulerHandle, Task, TaskStats};
pub use transaction_monitor::{TransactionMonitor, TransactionReceipt, TransactionStatus};
pub use units::Unit;
