//! Time-budgeted retry and backoff for transient key-value store errors.
//!
//! [`retry::RetryExecutor`] re-issues a failed idempotent operation with a
//! configurable delay shape until it succeeds, hits a non-retryable error,
//! reaches the retry ceiling, or outlives its wall-clock budget.

pub mod client;
pub mod config;
pub mod control;
pub mod logging;
pub mod retry;
