use rexec_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        if let Err(err) = logging::init_logging_stderr() {
            eprintln!("rexec: logging disabled: {:#}", err);
        }
    }

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("rexec error: {:#}", err);
        std::process::exit(1);
    }
}
