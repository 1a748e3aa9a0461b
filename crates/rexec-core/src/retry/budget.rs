//! Wall-clock budget over a whole retry run.
//!
//! [`BudgetedBackoff`] holds configuration only (strategy + budget) and is
//! shared freely. Everything that belongs to one run lives in a
//! [`RunContext`], which the caller creates when the run's first failure
//! happens; creating it is what starts the budget clock.

use super::backoff::Backoff;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-run state threaded through every [`BudgetedBackoff::compute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    started: Instant,
}

impl RunContext {
    /// Start the budget clock at `now` (the instant of the first failure).
    pub fn start(now: Instant) -> Self {
        Self { started: now }
    }

    /// Time since the run's first failure. Zero if `now` is before the start.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// Returned when the run has outlived its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("retry budget of {budget:?} exceeded after {elapsed:?}")]
pub struct BudgetExceeded {
    pub elapsed: Duration,
    pub budget: Duration,
}

/// A delay strategy with an optional wall-clock ceiling on the whole run.
///
/// `budget: None` behaves exactly like the wrapped strategy.
#[derive(Clone)]
pub struct BudgetedBackoff {
    strategy: Arc<dyn Backoff>,
    budget: Option<Duration>,
}

impl fmt::Debug for BudgetedBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetedBackoff")
            .field("strategy", &"<backoff>")
            .field("budget", &self.budget)
            .finish()
    }
}

impl BudgetedBackoff {
    pub fn new<B: Backoff + 'static>(strategy: B, budget: Option<Duration>) -> Self {
        Self::from_arc(Arc::new(strategy), budget)
    }

    pub fn from_arc(strategy: Arc<dyn Backoff>, budget: Option<Duration>) -> Self {
        // A zero budget means "unbounded", same as a non-positive config value.
        let budget = budget.filter(|b| !b.is_zero());
        Self { strategy, budget }
    }

    /// Budget from config seconds: `<= 0` means unbounded.
    pub fn with_budget_secs<B: Backoff + 'static>(strategy: B, budget_secs: f64) -> Self {
        Self::new(strategy, Some(super::backoff::secs_to_duration(budget_secs)))
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Delay before the retry following failure number `attempt`.
    ///
    /// For `attempt >= 2` the budget is checked first; an overrun fails
    /// without consulting the strategy. The first failure is never refused,
    /// since its context was created at that very failure.
    pub fn compute(
        &self,
        attempt: u32,
        ctx: &RunContext,
        now: Instant,
    ) -> Result<Duration, BudgetExceeded> {
        if attempt > 1 {
            if let Some(budget) = self.budget {
                let elapsed = ctx.elapsed(now);
                if elapsed > budget {
                    return Err(BudgetExceeded { elapsed, budget });
                }
            }
        }
        Ok(self.strategy.compute(attempt))
    }
}
