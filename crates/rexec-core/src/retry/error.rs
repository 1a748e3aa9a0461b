//! Terminal errors of a retry run.

use super::budget::BudgetExceeded;
use super::classify::{Classify, ErrorKind};

/// Why a retry run gave up. `E` is the operation's own error type.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Error outside the retryable set; returned after the first invocation.
    #[error("non-retryable error")]
    Permanent(#[source] E),
    /// The retry ceiling was reached; carries the last transient error.
    #[error("gave up after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
    /// The backoff budget ran out. Supersedes the transient error that
    /// triggered the check, which is kept in `last`.
    #[error("retry budget exhausted after {attempts} attempts")]
    BudgetExceeded {
        attempts: u32,
        #[source]
        budget: BudgetExceeded,
        last: E,
    },
    /// The run's cancel token fired.
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent(_) => 1,
            RetryError::Exhausted { attempts, .. }
            | RetryError::BudgetExceeded { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, RetryError::BudgetExceeded { .. })
    }

    /// The last error the operation returned, if any.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            RetryError::Permanent(e)
            | RetryError::Exhausted { source: e, .. }
            | RetryError::BudgetExceeded { last: e, .. } => Some(e),
            RetryError::Cancelled { .. } => None,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            RetryError::Permanent(e)
            | RetryError::Exhausted { source: e, .. }
            | RetryError::BudgetExceeded { last: e, .. } => Some(e),
            RetryError::Cancelled { .. } => None,
        }
    }
}

impl<E: Classify> Classify for RetryError<E> {
    /// Lets an outer retry layer treat an inner budget overrun as a timeout.
    fn kind(&self) -> ErrorKind {
        match self {
            RetryError::Permanent(e) | RetryError::Exhausted { source: e, .. } => e.kind(),
            RetryError::BudgetExceeded { .. } => ErrorKind::Timeout,
            RetryError::Cancelled { .. } => ErrorKind::Other,
        }
    }
}
