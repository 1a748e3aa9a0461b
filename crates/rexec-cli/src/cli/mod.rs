//! CLI for the rexec retry policy engine.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rexec_core::config::{self, RexecConfig};

use commands::{run_config, run_probe, run_schedule};

/// Top-level CLI for rexec.
#[derive(Debug, Parser)]
#[command(name = "rexec")]
#[command(about = "rexec: time-budgeted retries for transient store errors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-invocation overrides of the `[retry]` config section.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct RetryOverrides {
    /// Wall-clock budget in seconds for the whole retry run (<= 0 = unbounded).
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub budget: Option<f64>,
    /// Maximum number of retries (negative = unbounded).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub max_retries: Option<i64>,
}

impl RetryOverrides {
    /// Config with these overrides applied.
    pub fn apply(&self, cfg: &RexecConfig) -> RexecConfig {
        let mut cfg = cfg.clone();
        if let Some(budget) = self.budget {
            cfg.retry.budget_secs = budget;
        }
        if let Some(max_retries) = self.max_retries {
            cfg.retry.max_retries = max_retries;
        }
        cfg
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Connect to a store address, retrying transient failures under the configured policy.
    Probe {
        /// Store address, e.g. 127.0.0.1:6379.
        addr: String,
        #[command(flatten)]
        retry: RetryOverrides,
        /// Per-attempt connect timeout in milliseconds.
        #[arg(long, value_name = "MS")]
        connect_timeout_ms: Option<u64>,
    },

    /// Print the backoff schedule the configured policy would follow for an always-failing operation.
    Schedule {
        #[command(flatten)]
        retry: RetryOverrides,
        /// Stop listing after this many attempts.
        #[arg(long, default_value = "20", value_name = "N")]
        attempts: u32,
    },

    /// Show the config file path and the effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Probe {
                addr,
                retry,
                connect_timeout_ms,
            } => {
                let mut cfg = retry.apply(&cfg);
                if let Some(ms) = connect_timeout_ms {
                    cfg.connect_timeout_ms = ms;
                }
                run_probe(&cfg, &addr).await?;
            }
            CliCommand::Schedule { retry, attempts } => run_schedule(&retry.apply(&cfg), attempts)?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
