//! Blocking retry loop: run a closure until success or the executor says stop.

use super::budget::RunContext;
use super::classify::Classify;
use super::error::RetryError;
use super::executor::RetryExecutor;
use crate::control::CancelToken;
use std::fmt;

impl RetryExecutor {
    /// Runs `op` until it succeeds or a stop condition is hit.
    /// On retryable failure, sleeps for the backoff delay then tries again.
    pub fn run<T, E, F>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        self.run_blocking(op, None)
    }

    /// Like [`run`](Self::run), but a cancelled token interrupts the current
    /// sleep and prevents further invocations.
    pub fn run_with_cancel<T, E, F>(&self, op: F, cancel: &CancelToken) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        self.run_blocking(op, Some(cancel))
    }

    fn run_blocking<T, E, F>(
        &self,
        mut op: F,
        cancel: Option<&CancelToken>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        let mut attempt = 1u32;
        let mut ctx: Option<RunContext> = None;
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                });
            }
            match op() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let delay = self.on_failure(attempt, e, &mut ctx, self.clock.now())?;
                    if self.clock.sleep(delay, cancel).is_err() {
                        tracing::debug!(attempt, "retry cancelled during backoff");
                        return Err(RetryError::Cancelled { attempts: attempt });
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
