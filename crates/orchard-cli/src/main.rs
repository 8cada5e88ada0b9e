mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use orchard_core::OrchardError;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const LOG_ENV: &str = "ORCHARD_LOG";
const DEFAULT_LOG_DIRECTIVE: &str = "orchard=info";

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let operation = cli.command.operation();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(operation, &err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Engine errors leave as their JSON payload; anything else as plain text.
fn report_error(operation: &str, err: &anyhow::Error) {
    match err.downcast_ref::<OrchardError>() {
        Some(engine) => match serde_json::to_string(&engine.to_payload(operation)) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!("error: {engine}"),
        },
        None => eprintln!("error: {err:#}"),
    }
}
