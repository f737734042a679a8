//! Timeout configuration for outbound carrier requests
//!
//! Every request is bounded; an unresponsive carrier endpoint must not
//! stall the caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time to establish a connection
    pub connect_timeout: Duration,
    /// Total time for the entire request, including the body
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Invalid timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutConfigError {
    #[error("connect timeout cannot be zero")]
    ZeroConnect,
    #[error("request timeout cannot be zero")]
    ZeroRequest,
    #[error("request timeout ({request:?}) must be >= connect timeout ({connect:?})")]
    RequestShorterThanConnect { request: Duration, connect: Duration },
}

impl TimeoutConfig {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Same connect timeout, different total budget
    pub fn with_request_timeout(&self, timeout: Duration) -> Self {
        Self {
            request_timeout: timeout,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), TimeoutConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(TimeoutConfigError::ZeroConnect);
        }
        if self.request_timeout.is_zero() {
            return Err(TimeoutConfigError::ZeroRequest);
        }
        if self.request_timeout < self.connect_timeout {
            return Err(TimeoutConfigError::RequestShorterThanConnect {
                request: self.request_timeout,
                connect: self.connect_timeout,
            });
        }
        Ok(())
    }
}
