//! CLI command handlers. Each command is in its own file.

mod config;
mod probe;
mod schedule;

pub use config::run_config;
pub use probe::run_probe;
pub use schedule::run_schedule;
