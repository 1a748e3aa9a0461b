//! Retry and backoff policy.
//!
//! This module encapsulates error classification (connection failures,
//! timeouts, a busy or loading store), delay strategies, the wall-clock
//! budget over a whole run, and the executor that drives the retry loop.

mod backoff;
mod budget;
mod classify;
mod clock;
mod error;
mod executor;
mod run;
mod run_async;

pub use backoff::{Backoff, BackoffShape, Constant, EqualJitter, Exponential, FullJitter, NoBackoff};
pub use budget::{BudgetExceeded, BudgetedBackoff, RunContext};
pub use classify::{classify_io_error, classify_reply, Classify, ErrorKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RetryError;
pub use executor::{RetryDecision, RetryEvent, RetryExecutor};
