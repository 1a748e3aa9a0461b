//! `rexec config` – show where the config lives and what is in effect.

use anyhow::Result;
use rexec_core::config::{self, RexecConfig};

pub fn run_config(cfg: &RexecConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
