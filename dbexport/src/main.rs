//! MySQL table export tool.
//!
//! This binary connects to the database described by `config.json` and
//! writes every base table of the schema to `<OUTPUT>/<table>.json`.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - The database password is never printed or logged

use chrono::Local;
use clap::Parser;
use dbexport::{Cli, format_summary, run};
use dbexport_core::init_logging;
use std::process::ExitCode;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures
            return if e.print().is_err() || e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {}", e.report());
        return ExitCode::FAILURE;
    }

    let started_at = Local::now();
    match run(&cli, started_at).await {
        Ok(summary) => {
            if !cli.global.quiet {
                println!("{}", format_summary(&summary));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("Run failed ({} error): {:?}", e.category(), e);
            eprintln!("Error: {}", e.report());
            ExitCode::FAILURE
        }
    }
}
