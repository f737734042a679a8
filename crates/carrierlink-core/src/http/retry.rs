//! Retry logic with exponential backoff for idempotent requests
//!
//! Only read-only calls (rate quotes, tracking, connectivity probes) go
//! through here, and only transient failures are retried. Logins, order
//! creation and cancellation are sent exactly once.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RawFailure;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to randomize delays
    pub jitter: bool,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            jitter: true,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create an exponential backoff instance
    pub fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            max_interval: self.max_delay,
            multiplier: self.multiplier,
            max_elapsed_time: None, // attempts are capped separately
            ..Default::default()
        };

        if !self.jitter {
            backoff.randomization_factor = 0.0;
        }

        backoff
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    NoRetry,
}

/// Tracks attempts and backoff for one logical request
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempts: 0,
            backoff,
        }
    }

    /// Determine if a request should be retried based on the failure
    pub fn should_retry(&mut self, failure: &RawFailure) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts {
            return RetryDecision::NoRetry;
        }

        if !failure.is_transient() {
            return RetryDecision::NoRetry;
        }

        self.attempts += 1;

        let delay = self
            .backoff
            .next_backoff()
            .unwrap_or(self.policy.max_delay);

        RetryDecision::Retry { delay }
    }

    /// Number of retries made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Execute a request with retry logic
pub async fn execute_with_retry<F, Fut, T>(mut request_fn: F, policy: &RetryPolicy) -> Result<T, RawFailure>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RawFailure>>,
{
    let mut handler = RetryHandler::new(policy.clone());

    loop {
        match request_fn().await {
            Ok(response) => return Ok(response),
            Err(failure) => match handler.should_retry(&failure) {
                RetryDecision::Retry { delay } => {
                    tracing::warn!(
                        attempt = handler.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        failure = %failure.summary(),
                        "Carrier request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => return Err(failure),
            },
        }
    }
}
