use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{BackoffShape, BudgetedBackoff, ErrorKind, RetryExecutor};

/// Retry policy parameters (the `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Wall-clock ceiling in seconds for a whole retry run, measured from the
    /// first failure. `<= 0` means no budget.
    #[serde(default = "default_budget_secs")]
    pub budget_secs: f64,
    /// Maximum number of retries after the first attempt. Negative = unbounded.
    #[serde(default = "default_max_retries")]
    pub max_retries: i64,
    /// Error kinds treated as transient.
    #[serde(default = "default_retryable")]
    pub retryable: Vec<ErrorKind>,
    /// Delay shape between attempts.
    #[serde(default)]
    pub backoff: BackoffShape,
}

fn default_budget_secs() -> f64 {
    2.0
}

fn default_max_retries() -> i64 {
    -1
}

fn default_retryable() -> Vec<ErrorKind> {
    ErrorKind::TRANSIENT.to_vec()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            budget_secs: default_budget_secs(),
            max_retries: default_max_retries(),
            retryable: default_retryable(),
            backoff: BackoffShape::default(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BudgetedBackoff {
        BudgetedBackoff::with_budget_secs(self.backoff.build(), self.budget_secs)
    }

    /// Build an executor using the system clock.
    pub fn build_executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.policy())
            .with_max_retries(self.max_retries)
            .with_retryable(self.retryable.iter().copied())
    }
}

/// Global configuration loaded from `~/.config/rexec/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RexecConfig {
    /// Per-attempt TCP connect timeout for `rexec probe`, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

impl Default for RexecConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl RexecConfig {
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rexec")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RexecConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RexecConfig> {
    if !path.exists() {
        let default_cfg = RexecConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(path)
}

/// Parse an existing config file.
pub fn load_from(path: &Path) -> Result<RexecConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: RexecConfig = toml::from_str(&data)?;
    Ok(cfg)
}
