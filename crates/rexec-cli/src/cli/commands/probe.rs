//! `rexec probe <addr>` – connect to a store, retrying under the configured policy.
//!
//! Connecting is idempotent, so it is always safe to retry. Ctrl-C cancels
//! the run, including a backoff sleep in progress.

use anyhow::{Context, Result};
use rexec_core::config::RexecConfig;
use rexec_core::control::CancelToken;
use rexec_core::retry::RetryExecutor;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// One connect attempt, bounded by `timeout`. A timeout surfaces as `TimedOut`
/// so it classifies as transient.
async fn connect_once(addr: &str, timeout: Duration) -> io::Result<SocketAddr> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(stream) => stream?.peer_addr(),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {:?}", timeout),
        )),
    }
}

fn probe_executor(cfg: &RexecConfig) -> RetryExecutor {
    cfg.retry.build_executor().on_retry(|ev| {
        eprintln!(
            "attempt {} failed ({}), retrying in {:?} ({:.2}s elapsed)",
            ev.attempt,
            ev.kind,
            ev.delay,
            ev.elapsed.as_secs_f64()
        );
    })
}

pub async fn run_probe(cfg: &RexecConfig, addr: &str) -> Result<()> {
    let executor = probe_executor(cfg);
    let timeout = Duration::from_millis(cfg.connect_timeout_ms.max(1));

    let cancel = CancelToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let started = Instant::now();
    let result = executor
        .run_async_with_cancel(move || connect_once(addr, timeout), &cancel)
        .await;
    ctrl_c.abort();

    let peer = result.with_context(|| format!("probe {}", addr))?;
    tracing::info!(%peer, "probe connected");
    println!(
        "connected to {} in {:.2}s",
        peer,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexec_core::retry::RetryError;

    fn quick_config(budget_secs: f64, max_retries: i64) -> RexecConfig {
        let mut cfg = RexecConfig::default();
        cfg.connect_timeout_ms = 200;
        cfg.retry.budget_secs = budget_secs;
        cfg.retry.max_retries = max_retries;
        cfg
    }

    #[tokio::test]
    async fn probe_connects_to_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        run_probe(&quick_config(2.0, -1), &addr).await.unwrap();
    }

    #[tokio::test]
    async fn probe_gives_up_on_closed_port() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let err = run_probe(&quick_config(0.2, -1), &addr).await.unwrap_err();
        let retry_err = err
            .downcast_ref::<RetryError<io::Error>>()
            .expect("retry error in chain");
        assert!(retry_err.is_budget_exceeded());
    }

    #[tokio::test]
    async fn probe_respects_max_retries() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let err = run_probe(&quick_config(-1.0, 2), &addr).await.unwrap_err();
        match err.downcast_ref::<RetryError<io::Error>>() {
            Some(RetryError::Exhausted { attempts, .. }) => assert_eq!(*attempts, 3),
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }
}
