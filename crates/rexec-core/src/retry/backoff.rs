//! Delay strategies: how long to wait before the next attempt.
//!
//! A strategy only answers "what delay for failure number `attempt`". Whether
//! the run is still allowed to retry at all (budget, ceiling) is decided by
//! [`BudgetedBackoff`](super::BudgetedBackoff) and the executor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Per-attempt delay computation. `attempt` is 1-based (1 = first failure).
pub trait Backoff: Send + Sync {
    fn compute(&self, attempt: u32) -> Duration;
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn compute(&self, attempt: u32) -> Duration {
        (**self).compute(attempt)
    }
}

impl<B: Backoff + ?Sized> Backoff for Arc<B> {
    fn compute(&self, attempt: u32) -> Duration {
        (**self).compute(attempt)
    }
}

/// `base * 2^(attempt-1)`, saturating, optionally capped.
fn exponential(base: Duration, cap: Option<Duration>, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let raw = base.saturating_mul(1u32 << shift);
    match cap {
        Some(cap) => raw.min(cap),
        None => raw,
    }
}

/// Exponential backoff: delays base, 2*base, 4*base, ... up to `cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exponential {
    pub base: Duration,
    pub cap: Option<Duration>,
}

impl Exponential {
    pub fn new(base: Duration) -> Self {
        Self { base, cap: None }
    }

    pub fn capped(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap: Some(cap),
        }
    }
}

impl Backoff for Exponential {
    fn compute(&self, attempt: u32) -> Duration {
        exponential(self.base, self.cap, attempt)
    }
}

/// Same delay for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub Duration);

impl Backoff for Constant {
    fn compute(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Retry immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn compute(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

fn random_up_to(max: Duration) -> Duration {
    let nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::rng().random_range(0..=nanos))
}

/// Uniformly random delay in `[0, exponential(attempt)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullJitter {
    pub base: Duration,
    pub cap: Option<Duration>,
}

impl Backoff for FullJitter {
    fn compute(&self, attempt: u32) -> Duration {
        random_up_to(exponential(self.base, self.cap, attempt))
    }
}

/// Half the exponential delay plus a uniformly random share of the other half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualJitter {
    pub base: Duration,
    pub cap: Option<Duration>,
}

impl Backoff for EqualJitter {
    fn compute(&self, attempt: u32) -> Duration {
        let half = exponential(self.base, self.cap, attempt) / 2;
        half + random_up_to(half)
    }
}

/// Convert config seconds to a `Duration`. Non-positive and NaN map to zero,
/// values too large for a `Duration` saturate.
pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if !(secs > 0.0) {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn cap_from_secs(cap_secs: Option<f64>) -> Option<Duration> {
    cap_secs.filter(|s| *s > 0.0).map(secs_to_duration)
}

/// Serializable choice of delay strategy (the `[retry.backoff]` config table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffShape {
    Exponential {
        base_secs: f64,
        /// Upper bound on a single delay; absent or <= 0 means uncapped.
        #[serde(default)]
        cap_secs: Option<f64>,
    },
    Constant {
        delay_secs: f64,
    },
    None,
    FullJitter {
        base_secs: f64,
        #[serde(default)]
        cap_secs: Option<f64>,
    },
    EqualJitter {
        base_secs: f64,
        #[serde(default)]
        cap_secs: Option<f64>,
    },
}

impl Default for BackoffShape {
    /// Small exponential steps capped at roughly half a second, suited to a
    /// store on the local network.
    fn default() -> Self {
        BackoffShape::Exponential {
            base_secs: 0.008,
            cap_secs: Some(0.512),
        }
    }
}

impl BackoffShape {
    /// Build the concrete strategy.
    pub fn build(&self) -> Arc<dyn Backoff> {
        match *self {
            BackoffShape::Exponential { base_secs, cap_secs } => Arc::new(Exponential {
                base: secs_to_duration(base_secs),
                cap: cap_from_secs(cap_secs),
            }),
            BackoffShape::Constant { delay_secs } => {
                Arc::new(Constant(secs_to_duration(delay_secs)))
            }
            BackoffShape::None => Arc::new(NoBackoff),
            BackoffShape::FullJitter { base_secs, cap_secs } => Arc::new(FullJitter {
                base: secs_to_duration(base_secs),
                cap: cap_from_secs(cap_secs),
            }),
            BackoffShape::EqualJitter { base_secs, cap_secs } => Arc::new(EqualJitter {
                base: secs_to_duration(base_secs),
                cap: cap_from_secs(cap_secs),
            }),
        }
    }
}
