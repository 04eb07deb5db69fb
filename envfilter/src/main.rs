// envfilter/src/main.rs
//! envfilter entry point.
//!
//! Parses the command line, initializes logging, and maps the outcome of the
//! selected subcommand onto the process exit code.

use clap::Parser;
use std::process::ExitCode;

use envfilter::cli::Cli;
use envfilter::{dispatch, logger, output};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));

    match dispatch(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            output::error_msg(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
