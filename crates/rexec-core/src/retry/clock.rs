//! Time source for the blocking retry loop.
//!
//! The executor reads "now" and sleeps through a [`Clock`] so tests can drive
//! multi-second backoff schedules without waiting for them.

use crate::control::{CancelToken, Cancelled};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block for `delay`; with a token, return `Cancelled` as soon as it fires.
    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Result<(), Cancelled>;
}

/// Real wall clock and thread sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Result<(), Cancelled> {
        match cancel {
            Some(token) => token.sleep(delay),
            None => {
                std::thread::sleep(delay);
                Ok(())
            }
        }
    }
}

/// Virtual clock: `sleep` advances time instantly and records the delay.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move time forward without recording a sleep (e.g. a slow operation).
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.offset = state.offset.saturating_add(by);
    }

    /// Virtual time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).offset
    }

    /// Every delay passed to `sleep`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sleeps
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, delay: Duration, cancel: Option<&CancelToken>) -> Result<(), Cancelled> {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Cancelled);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.offset = state.offset.saturating_add(delay);
        state.sleeps.push(delay);
        Ok(())
    }
}
