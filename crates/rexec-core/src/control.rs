//! Cancellation for in-flight retry runs.
//!
//! A `CancelToken` is shared between the code driving a retry run and
//! whoever may want to stop it (Ctrl-C handler, shutdown path). Cancelling
//! wakes a run that is sleeping between attempts, blocking or async, and the
//! run returns `RetryError::Cancelled` without another attempt.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Error returned when a sleep was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("retry run cancelled")]
pub struct Cancelled;

#[derive(Default)]
struct Inner {
    token: CancellationToken,
    // Parks blocking sleepers; the async side waits on `token` directly.
    lock: Mutex<()>,
    cv: Condvar,
}

/// Shared cancel flag. Clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; wakes every sleeper.
    pub fn cancel(&self) {
        {
            // Cancel under the lock so a blocking sleeper cannot miss the
            // wakeup between checking the flag and parking.
            let _guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.inner.token.cancel();
        }
        self.inner.cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Block the calling thread for `delay`, returning early with `Cancelled`
    /// if the token fires.
    pub fn sleep(&self, delay: Duration) -> Result<(), Cancelled> {
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _timeout) = self
            .inner
            .cv
            .wait_timeout_while(guard, delay, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the token is cancelled (immediately if it already is).
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert_eq!(token.sleep(Duration::from_millis(5)), Ok(()));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_wakes_blocking_sleeper() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });
        let started = Instant::now();
        assert_eq!(token.sleep(Duration::from_secs(30)), Err(Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }

    #[test]
    fn already_cancelled_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert_eq!(token.sleep(Duration::from_secs(30)), Err(Cancelled));
    }

    #[tokio::test]
    async fn cancelled_future_resolves() {
        let token = CancelToken::new();
        let remote = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remote.cancel();
        });
        tokio::time::timeout(Duration::from_secs(10), token.cancelled())
            .await
            .expect("cancelled() should resolve");
    }

    #[tokio::test]
    async fn cancelled_resolves_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token resolves immediately");
        assert!(token.is_cancelled());
    }
}
