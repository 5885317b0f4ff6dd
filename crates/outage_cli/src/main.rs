//! `outage`: reads an incident snapshot, runs one report builder, prints JSON.
//!
//! Logs go to stderr (filter with `RUST_LOG`, default `info`) so stdout stays pipeable.

mod cli;
mod commands;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match commands::run(cli) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{json}") {
                error!(err = %e, "failed to write output");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = %e.code, retryable = e.retryable, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
