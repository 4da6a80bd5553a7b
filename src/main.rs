//! Basketry CLI

use std::process::ExitCode;

use tracing::error;

use crate::cli::Cli;

mod cli;

/// Basketry CLI entry point
pub fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(parse_error) => {
            let code = if parse_error.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };

            return match parse_error.print() {
                Ok(()) => code,
                Err(_) => ExitCode::FAILURE,
            };
        }
    };

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!("{run_error}");

            #[expect(
                clippy::print_stderr,
                reason = "errors must reach the user even when logging is filtered out"
            )]
            {
                eprintln!("Error: {run_error}");
            }

            ExitCode::FAILURE
        }
    }
}
