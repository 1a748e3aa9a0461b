//! Retry executor: configuration plus the per-failure decision shared by the
//! blocking and async run loops.

use super::backoff::Backoff;
use super::budget::{BudgetExceeded, BudgetedBackoff, RunContext};
use super::classify::{Classify, ErrorKind};
use super::clock::{Clock, SystemClock};
use super::error::RetryError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decision for one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Error kind is not in the retryable set.
    NotRetryable,
    /// Retry ceiling reached.
    Exhausted,
    /// Run is older than the budget.
    OverBudget(BudgetExceeded),
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Passed to the retry hook before each sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryEvent {
    /// Failure number that is about to be retried (1-based).
    pub attempt: u32,
    pub kind: ErrorKind,
    pub delay: Duration,
    /// Time since the run's first failure.
    pub elapsed: Duration,
}

type RetryHook = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Runs idempotent operations, retrying transient failures with backoff.
///
/// Immutable once built and cheap to clone. Per-run state lives on the stack
/// of each `run*` call, so one executor can serve concurrent runs.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: BudgetedBackoff,
    retryable: HashSet<ErrorKind>,
    max_retries: Option<u32>,
    pub(super) clock: Arc<dyn Clock>,
    on_retry: Option<RetryHook>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("retryable", &self.retryable)
            .field("max_retries", &self.max_retries)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryExecutor {
    /// Executor with the default transient set, unbounded retries and the system clock.
    pub fn new(policy: BudgetedBackoff) -> Self {
        Self {
            policy,
            retryable: ErrorKind::TRANSIENT.into_iter().collect(),
            max_retries: None,
            clock: Arc::new(SystemClock),
            on_retry: None,
        }
    }

    /// Shorthand for a strategy plus optional budget.
    pub fn with_backoff<B: Backoff + 'static>(strategy: B, budget: Option<Duration>) -> Self {
        Self::new(BudgetedBackoff::new(strategy, budget))
    }

    /// Retry ceiling; negative means unbounded (only the budget stops the run).
    pub fn with_max_retries(mut self, max_retries: i64) -> Self {
        self.max_retries = if max_retries < 0 {
            None
        } else {
            Some(u32::try_from(max_retries).unwrap_or(u32::MAX))
        };
        self
    }

    /// Replace the set of error kinds treated as transient.
    pub fn with_retryable<I: IntoIterator<Item = ErrorKind>>(mut self, kinds: I) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    /// Time source for the blocking loop. The async loop always uses tokio time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Called before every sleep; runs on the retrying thread/task.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetryEvent) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    pub fn policy(&self) -> &BudgetedBackoff {
        &self.policy
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Decide what to do after failure number `attempt` (1-based).
    ///
    /// Checks, in order: retryable kind, retry ceiling, then budget and delay.
    pub fn decide(
        &self,
        attempt: u32,
        kind: ErrorKind,
        ctx: &RunContext,
        now: Instant,
    ) -> RetryDecision {
        if !self.is_retryable(kind) {
            return RetryDecision::NotRetryable;
        }
        // `attempt - 1` retries have been made so far.
        if self.max_retries.is_some_and(|max| attempt > max) {
            return RetryDecision::Exhausted;
        }
        match self.policy.compute(attempt, ctx, now) {
            Ok(delay) => RetryDecision::RetryAfter(delay),
            Err(over) => RetryDecision::OverBudget(over),
        }
    }

    /// Handle one failed invocation: start the run clock on the first
    /// failure, then either return the delay to sleep or the terminal error.
    pub(super) fn on_failure<E>(
        &self,
        attempt: u32,
        err: E,
        ctx: &mut Option<RunContext>,
        now: Instant,
    ) -> Result<Duration, RetryError<E>>
    where
        E: Classify + fmt::Display,
    {
        let run = *ctx.get_or_insert_with(|| RunContext::start(now));
        let kind = err.kind();
        match self.decide(attempt, kind, &run, now) {
            RetryDecision::NotRetryable => {
                tracing::debug!(attempt, ?kind, error = %err, "non-retryable error");
                Err(RetryError::Permanent(err))
            }
            RetryDecision::Exhausted => {
                tracing::warn!(attempt, ?kind, error = %err, "retry ceiling reached");
                Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                })
            }
            RetryDecision::OverBudget(budget) => {
                tracing::warn!(
                    attempt,
                    elapsed_ms = budget.elapsed.as_millis() as u64,
                    budget_ms = budget.budget.as_millis() as u64,
                    error = %err,
                    "retry budget exceeded"
                );
                Err(RetryError::BudgetExceeded {
                    attempts: attempt,
                    budget,
                    last: err,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                let event = RetryEvent {
                    attempt,
                    kind,
                    delay,
                    elapsed: run.elapsed(now),
                };
                tracing::debug!(
                    attempt,
                    ?kind,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient error, retrying"
                );
                if let Some(hook) = &self.on_retry {
                    hook(&event);
                }
                Ok(delay)
            }
        }
    }
}
