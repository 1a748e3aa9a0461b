//! Async retry loop for tokio callers: the backoff sleep suspends only the
//! calling task.
//!
//! Time is read from `tokio::time::Instant` rather than the executor's
//! `Clock`, so runtime time control (paused test time) applies here too.

use super::budget::RunContext;
use super::classify::Classify;
use super::error::RetryError;
use super::executor::RetryExecutor;
use crate::control::CancelToken;
use std::fmt;
use std::future::Future;

fn tokio_now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

impl RetryExecutor {
    pub async fn run_async<T, E, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.run_tokio(op, None).await
    }

    /// Async run where cancelling `cancel` interrupts the backoff sleep.
    pub async fn run_async_with_cancel<T, E, F, Fut>(
        &self,
        op: F,
        cancel: &CancelToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.run_tokio(op, Some(cancel)).await
    }

    async fn run_tokio<T, E, F, Fut>(
        &self,
        mut op: F,
        cancel: Option<&CancelToken>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
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
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let delay = self.on_failure(attempt, e, &mut ctx, tokio_now())?;
                    match cancel {
                        Some(token) => {
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = token.cancelled() => {
                                    tracing::debug!(attempt, "retry cancelled during backoff");
                                    return Err(RetryError::Cancelled { attempts: attempt });
                                }
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
