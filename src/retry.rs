use crate::config::RetrySettings;
use crate::error::DaemonError;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.base_delay_seconds),
            Duration::from_secs(settings.max_delay_seconds),
            settings.backoff_multiplier,
        )
    }
}

/// Whether a failed attempt is worth repeating.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl Retryable for DaemonError {
    fn is_retryable(&self) -> bool {
        DaemonError::is_retryable(self)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is reached. The last error is returned unchanged.
pub async fn execute_with_retry<F, Fut, T, E>(
    operation: F,
    retry_config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send,
    E: fmt::Display + Retryable,
{
    let mut attempt = 1;

    loop {
        debug!(
            operation = operation_name,
            attempt,
            max_attempts = retry_config.max_attempts,
            "attempting operation"
        );

        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        if !err.is_retryable() {
            warn!(operation = operation_name, attempt, "operation failed permanently: {}", err);
            return Err(err);
        }
        if attempt >= retry_config.max_attempts {
            warn!(operation = operation_name, attempt, "giving up: {}", err);
            return Err(err);
        }

        let delay = calculate_delay(attempt, retry_config);
        warn!(operation = operation_name, attempt, ?delay, "operation failed, retrying: {}", err);
        sleep(delay).await;
        attempt += 1;
    }
}

fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay =
        config.base_delay.as_secs_f64() * config.backoff_multiplier.powi((attempt - 1) as i32);

    let delay_seconds = exponential_delay.min(config.max_delay.as_secs_f64());
    Duration::from_secs_f64(delay_seconds)
}
