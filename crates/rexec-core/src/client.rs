//! Retrying wrapper around a store client.
//!
//! The store client is an external collaborator; all the retry layer needs
//! from it is [`Dispatch`]: run one command, fail with a classifiable error.
//! [`Retrying`] wraps any dispatcher and sends every command through a
//! [`RetryExecutor`]. Only wrap clients whose commands are safe to repeat.

use crate::control::CancelToken;
use crate::retry::{Classify, RetryError, RetryExecutor};
use std::fmt;

/// Executes one command against the store.
pub trait Dispatch {
    type Command: ?Sized;
    type Reply;
    type Error;

    fn dispatch(&mut self, command: &Self::Command) -> Result<Self::Reply, Self::Error>;
}

/// A dispatcher whose failed commands are retried by an executor.
#[derive(Debug)]
pub struct Retrying<C> {
    inner: C,
    executor: RetryExecutor,
    cancel: Option<CancelToken>,
}

impl<C> Retrying<C> {
    pub fn new(inner: C, executor: RetryExecutor) -> Self {
        Self {
            inner,
            executor,
            cancel: None,
        }
    }

    /// Every subsequent dispatch observes this token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> Dispatch for Retrying<C>
where
    C: Dispatch,
    C::Error: Classify + fmt::Display,
{
    type Command = C::Command;
    type Reply = C::Reply;
    type Error = RetryError<C::Error>;

    fn dispatch(&mut self, command: &Self::Command) -> Result<Self::Reply, Self::Error> {
        let inner = &mut self.inner;
        match &self.cancel {
            Some(token) => self
                .executor
                .run_with_cancel(|| inner.dispatch(command), token),
            None => self.executor.run(|| inner.dispatch(command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{ErrorKind, Exponential, ManualClock};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    /// Replays scripted results and records the commands it saw.
    struct Scripted {
        script: VecDeque<Result<String, ErrorKind>>,
        seen: Vec<String>,
    }

    impl Dispatch for Scripted {
        type Command = str;
        type Reply = String;
        type Error = ErrorKind;

        fn dispatch(&mut self, command: &str) -> Result<String, ErrorKind> {
            self.seen.push(command.to_string());
            self.script.pop_front().unwrap_or(Err(ErrorKind::Other))
        }
    }

    fn retrying(script: Vec<Result<String, ErrorKind>>) -> (Retrying<Scripted>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let exec = RetryExecutor::with_backoff(
            Exponential::new(Duration::from_millis(100)),
            Some(Duration::from_secs(2)),
        )
        .with_clock(clock.clone());
        let client = Scripted {
            script: script.into(),
            seen: Vec::new(),
        };
        (Retrying::new(client, exec), clock)
    }

    #[test]
    fn same_command_is_reissued_until_success() {
        let (mut client, clock) = retrying(vec![
            Err(ErrorKind::BusyLoading),
            Err(ErrorKind::Connection),
            Ok("PONG".to_string()),
        ]);
        assert_eq!(client.dispatch("PING").unwrap(), "PONG");
        assert_eq!(client.get_ref().seen, vec!["PING"; 3]);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let (mut client, _clock) = retrying(vec![Err(ErrorKind::Other)]);
        let err = client.dispatch("GET k").unwrap_err();
        assert!(matches!(err, RetryError::Permanent(ErrorKind::Other)));
        assert_eq!(client.into_inner().seen.len(), 1);
    }

    #[test]
    fn cancelled_client_stops() {
        let token = CancelToken::new();
        let (client, _clock) = retrying(vec![Ok("x".to_string())]);
        let mut client = client.with_cancel(token.clone());
        token.cancel();
        let err = client.dispatch("GET k").unwrap_err();
        assert!(matches!(err, RetryError::Cancelled { attempts: 0 }));
        assert!(client.get_ref().seen.is_empty());
    }
}
