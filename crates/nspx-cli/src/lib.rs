//! Command-line front end for PFS0 (NSP) archives.
//!
//! The binary in `bin/nspx.rs` is a thin wrapper: it parses [`Cli`],
//! initializes logging and hands off to [`run`]. Everything else lives here so
//! it can be exercised from tests without spawning a process.

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{default_output_dir, format_listing, run};
pub use config::{Cli, Command, LogLevel};
pub use error::{CliError, ConfigError, exit_code};
