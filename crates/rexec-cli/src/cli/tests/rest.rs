//! Tests for schedule and config.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_schedule_default_attempts() {
    match parse(&["rexec", "schedule"]) {
        CliCommand::Schedule { retry, attempts } => {
            assert_eq!(attempts, 20);
            assert!(retry.budget.is_none());
        }
        _ => panic!("expected Schedule"),
    }
}

#[test]
fn cli_parse_schedule_with_budget() {
    match parse(&["rexec", "schedule", "--budget", "-1", "--attempts", "5"]) {
        CliCommand::Schedule { retry, attempts } => {
            assert_eq!(attempts, 5);
            assert_eq!(retry.budget, Some(-1.0));
        }
        _ => panic!("expected Schedule"),
    }
}

#[test]
fn cli_parse_config() {
    match parse(&["rexec", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}
