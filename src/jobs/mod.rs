pub mod dissolve_timed_out;
pub mod process_withdrawals;

pub use dissolve_timed_out::DissolveTimedOutMinipoolsJob;
pub use process_withdrawals::ProcessWithdrawalsJob;

use crate::config::MonitoringSettings;
use crate::provider::Provider;
use crate::transaction_monitor::TransactionMonitor;
use std::time::Duration;

/// How long a task waits for its own transactions to be mined.
#[derive(Debug, Clone, Copy)]
pub struct Confirmation {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Confirmation {
    pub fn from_settings(settings: &MonitoringSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.transaction_timeout_seconds),
            poll_interval: Duration::from_secs(settings.poll_interval_seconds),
        }
    }

    pub(crate) fn monitor(&self, provider: &Provider) -> TransactionMonitor {
        TransactionMonitor::new(provider.client(), self.timeout, self.poll_interval)
    }
}
