//! Retry logic and backoff strategies for notification providers
//!
//! Retries are always bounded by `max_attempts`. The caller gets back the
//! number of attempts spent, so exhaustion can be reported rather than hidden.

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider_base::ProviderError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000, // 1 second
            max_delay_ms: 30000,    // 30 seconds
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            exponential_base: 2.0,
            jitter: true,
        }
    }

    /// Create a config with no retries (fire-and-forget)
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            exponential_base: 1.0,
            jitter: false,
        }
    }

    /// Convert to exponential backoff configuration
    fn to_exponential_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_delay_ms),
            max_interval: Duration::from_millis(self.max_delay_ms),
            multiplier: self.exponential_base,
            max_elapsed_time: None,
            ..Default::default()
        };

        if !self.jitter {
            backoff.randomization_factor = 0.0;
        }

        // Start from initial_interval rather than the crate default
        backoff.reset();
        backoff
    }
}

/// Trait to determine if an error is retryable
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;

    /// Server-requested wait before the next attempt
    fn requested_delay(&self) -> Option<Duration> {
        None
    }
}

impl IsRetryable for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }

    fn requested_delay(&self) -> Option<Duration> {
        self.retry_delay().and_then(|d| d.to_std().ok())
    }
}

/// Result of a retried operation together with the attempts it took
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Retry an async operation with exponential backoff.
///
/// Non-retryable errors return immediately. A delay requested by the service
/// (e.g. `Retry-After`) is honoured but never exceeds `max_delay_ms`.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug + IsRetryable,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff = config.to_exponential_backoff();
    let mut attempt = 1;

    loop {
        debug!("Retry attempt {} of {}", attempt, max_attempts);

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Operation succeeded after {} attempts", attempt);
                }
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(error) => {
                if attempt >= max_attempts || !error.is_retryable() {
                    warn!(
                        "Operation failed after {} attempts, error: {:?}",
                        attempt, error
                    );
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                    };
                }

                let Some(mut delay) = backoff.next_backoff() else {
                    warn!("Backoff exhausted after {} attempts", attempt);
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                    };
                };
                if let Some(requested) = error.requested_delay() {
                    delay = delay.max(requested);
                }
                delay = delay.min(Duration::from_millis(config.max_delay_ms));

                warn!(
                    "Operation failed (attempt {}/{}), retrying in {:?}. Error: {:?}",
                    attempt, max_attempts, delay, error
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
