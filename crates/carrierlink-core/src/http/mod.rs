//! HTTP plumbing for carrier API communication
//!
//! This module provides:
//! - A JSON transport with explicit connect/request timeouts
//! - Retry with exponential backoff for idempotent reads
//! - Timeout configuration and validation

pub mod client;
pub mod retry;
pub mod timeout;

pub use client::HttpTransport;
pub use retry::{execute_with_retry, RetryDecision, RetryHandler, RetryPolicy};
pub use timeout::{TimeoutConfig, TimeoutConfigError};

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
