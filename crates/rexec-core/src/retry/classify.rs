//! Classify store and socket errors into retry policy error kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// High-level classification of an error for retry purposes.
///
/// This intentionally stays generic; callers map socket errors, store error
/// replies, or their own client errors into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network-level failure (connection refused/reset, broken pipe, etc.).
    Connection,
    /// Operation timed out (connect/read/write).
    Timeout,
    /// Store is temporarily unable to serve (loading dataset, busy script, failover).
    BusyLoading,
    /// Any other error (typically not retried).
    Other,
}

impl ErrorKind {
    /// Kinds retried when no explicit set is configured.
    pub const TRANSIENT: [ErrorKind; 3] = [
        ErrorKind::Connection,
        ErrorKind::Timeout,
        ErrorKind::BusyLoading,
    ];
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Connection => "connection error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::BusyLoading => "store busy or loading",
            ErrorKind::Other => "other error",
        };
        f.write_str(s)
    }
}

/// An error that can report its retry classification.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

impl Classify for io::Error {
    fn kind(&self) -> ErrorKind {
        classify_io_error(self)
    }
}

/// Classify a socket/IO error for retry decisions.
pub fn classify_io_error(e: &io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::AddrNotAvailable => ErrorKind::Connection,
        _ => ErrorKind::Other,
    }
}

/// Classify a store error reply (e.g. `-LOADING Redis is loading the dataset in memory`).
///
/// Only the leading error code is inspected; a leading `-` is tolerated.
pub fn classify_reply(reply: &str) -> ErrorKind {
    let code = reply
        .trim_start_matches('-')
        .split_whitespace()
        .next()
        .unwrap_or("");
    match code {
        "LOADING" | "BUSY" | "TRYAGAIN" | "MASTERDOWN" => ErrorKind::BusyLoading,
        _ => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeouts() {
        let e = io::Error::new(io::ErrorKind::TimedOut, "connect timed out");
        assert_eq!(classify_io_error(&e), ErrorKind::Timeout);
        let e = io::Error::from(io::ErrorKind::WouldBlock);
        // io::Error::kind is inherent, so go through the trait explicitly.
        assert_eq!(Classify::kind(&e), ErrorKind::Timeout);
    }

    #[test]
    fn io_connection_failures() {
        for k in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::UnexpectedEof,
        ] {
            assert_eq!(classify_io_error(&io::Error::from(k)), ErrorKind::Connection);
        }
    }

    #[test]
    fn io_other() {
        let e = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(classify_io_error(&e), ErrorKind::Other);
    }

    #[test]
    fn replies() {
        assert_eq!(
            classify_reply("-LOADING Redis is loading the dataset in memory"),
            ErrorKind::BusyLoading
        );
        assert_eq!(classify_reply("TRYAGAIN Multiple keys request"), ErrorKind::BusyLoading);
        assert_eq!(classify_reply("MASTERDOWN Link with MASTER is down"), ErrorKind::BusyLoading);
        assert_eq!(classify_reply("WRONGTYPE Operation against a key"), ErrorKind::Other);
        assert_eq!(classify_reply(""), ErrorKind::Other);
    }
}
