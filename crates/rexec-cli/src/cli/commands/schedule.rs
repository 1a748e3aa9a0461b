//! `rexec schedule` – dry-run the backoff policy against an always-failing operation.

use anyhow::Result;
use rexec_core::config::RexecConfig;
use rexec_core::retry::{ErrorKind, RetryDecision, RetryExecutor, RunContext};
use std::time::{Duration, Instant};

/// One row of the schedule: the failure number, what the policy decided, and
/// the simulated time since the first failure (operations take no time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRow {
    pub attempt: u32,
    pub elapsed: Duration,
    pub decision: RetryDecision,
}

/// Walk the policy for up to `max_rows` failures, stopping at the first
/// decision that ends the run, or once the simulated time no longer fits in
/// an `Instant`.
pub fn simulate(executor: &RetryExecutor, max_rows: u32) -> Vec<ScheduleRow> {
    let t0 = Instant::now();
    let ctx = RunContext::start(t0);
    let kind = ErrorKind::TRANSIENT
        .into_iter()
        .find(|k| executor.is_retryable(*k))
        .unwrap_or(ErrorKind::Connection);
    let mut elapsed = Duration::ZERO;
    let mut rows = Vec::new();
    for attempt in 1..=max_rows {
        let Some(now) = t0.checked_add(elapsed) else {
            break;
        };
        let decision = executor.decide(attempt, kind, &ctx, now);
        rows.push(ScheduleRow {
            attempt,
            elapsed,
            decision,
        });
        match decision {
            RetryDecision::RetryAfter(delay) => elapsed = elapsed.saturating_add(delay),
            _ => break,
        }
    }
    rows
}

pub fn run_schedule(cfg: &RexecConfig, max_rows: u32) -> Result<()> {
    let executor = cfg.retry.build_executor();
    println!("  {:>7}  {:>10}  {}", "Attempt", "Elapsed(s)", "Decision");
    println!("  {}  {}  {}", "-------", "----------", "--------");
    for row in simulate(&executor, max_rows) {
        let decision = match row.decision {
            RetryDecision::RetryAfter(d) => format!("retry in {:.3}s", d.as_secs_f64()),
            RetryDecision::Exhausted => "give up: retry ceiling reached".to_string(),
            RetryDecision::OverBudget(b) => {
                format!("give up: budget of {:.3}s exceeded", b.budget.as_secs_f64())
            }
            RetryDecision::NotRetryable => "give up: not retryable".to_string(),
        };
        println!(
            "  {:>7}  {:>10.3}  {}",
            row.attempt,
            row.elapsed.as_secs_f64(),
            decision
        );
    }
    Ok(())
}
