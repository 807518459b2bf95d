//! Exponential backoff for transient embedding failures.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay growth factor between attempts
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(delay.as_secs_f64() * self.multiplier).min(self.max_delay)
    }
}

#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    Failed { last_error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed { last_error, .. } => Err(last_error),
        }
    }
}

/// Errors that may succeed when the same operation is attempted again.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;
    let mut delay = config.initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(error) if attempts < config.max_attempts && error.is_retryable() => {
                tracing::warn!(
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                sleep(delay).await;
                delay = config.next_delay(delay);
            }
            Err(error) => {
                return RetryResult::Failed {
                    last_error: error,
                    attempts,
                };
            }
        }
    }
}
