//! `nspx` binary entry point.
//!
//! Parses the command line, initializes logging on stderr, validates the
//! configuration and runs the selected command. Failures are printed once and
//! mapped to an exit code by [`nspx_cli::exit_code`].

use nspx_cli::{Cli, exit_code, run};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::from_args();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cli
        .validate()
        .map_err(anyhow::Error::from)
        .and_then(|()| run(&cli, &mut std::io::stdout().lock()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
