//! Command-line configuration.
//!
//! Options come from CLI arguments, then `NSPX_*` environment variables, then
//! defaults. [`Cli::validate`] checks what clap cannot express on its own.

use crate::error::ConfigError;
use clap::{Parser, Subcommand};
use nspx_formats::pfs0::DEFAULT_BUFFER_SIZE;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Parsed command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nspx",
    about = "List, extract and create PFS0 (NSP) archives",
    version
)]
pub struct Cli {
    /// Set the logging level (overridden by `RUST_LOG`)
    #[arg(
        short,
        long,
        value_enum,
        global = true,
        env = "NSPX_LOG_LEVEL",
        default_value = "info"
    )]
    pub log_level: LogLevel,

    /// Copy buffer size in bytes
    #[arg(
        long,
        global = true,
        env = "NSPX_BUFFER_SIZE",
        default_value_t = DEFAULT_BUFFER_SIZE
    )]
    pub buffer_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the entries of an archive
    #[command(alias = "l")]
    List {
        /// Archive to read
        archive: PathBuf,
    },

    /// Extract entries from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive to read
        archive: PathBuf,

        /// Entry names to extract (all entries when omitted)
        names: Vec<String>,

        /// Destination directory (defaults to the archive path without its extension)
        #[arg(short, long, env = "NSPX_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Write entries over 4 GiB as numbered parts for FAT32 volumes
        #[arg(long)]
        split: bool,
    },

    /// Create an archive from files
    #[command(alias = "c")]
    Create {
        /// Archive to write
        output: PathBuf,

        /// Files to pack, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Log verbosity.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Header decoding and copy details
    Debug,
    /// Progress messages
    Info,
    /// Warnings only
    Warn,
    /// Errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Cli {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the buffer size is zero
    /// - the archive to read is missing or is not a regular file
    /// - an input file for `create` is missing or is not a regular file
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                option: "buffer-size",
                reason: "must be greater than zero".to_string(),
            });
        }

        match &self.command {
            Command::List { archive } | Command::Extract { archive, .. } => {
                require_file(archive)?;
            }
            Command::Create { files, .. } => {
                for file in files {
                    require_file(file)?;
                }
            }
        }

        Ok(())
    }
}

fn require_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract_defaults() {
        let cli = Cli::try_parse_from(["nspx", "extract", "title.nsp"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.buffer_size, DEFAULT_BUFFER_SIZE);
        match cli.command {
            Command::Extract {
                archive,
                names,
                split,
                ..
            } => {
                assert_eq!(archive, PathBuf::from("title.nsp"));
                assert!(names.is_empty());
                assert!(!split);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_requires_files() {
        assert!(Cli::try_parse_from(["nspx", "create", "out.nsp"]).is_err());
        let cli = Cli::try_parse_from(["nspx", "c", "out.nsp", "a", "b"]).unwrap();
        assert!(matches!(cli.command, Command::Create { ref files, .. } if files.len() == 2));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nspx",
            "list",
            "title.nsp",
            "--log-level",
            "warn",
            "--buffer-size",
            "512",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.buffer_size, 512);
        assert_eq!(Level::from(cli.log_level), Level::WARN);
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let dir = tempfile::tempdir().expect("Operation should succeed");
        let archive = dir.path().join("a.nsp");
        std::fs::write(&archive, b"PFS0").unwrap();

        let cli = Cli::try_parse_from([
            "nspx",
            "list",
            archive.to_str().unwrap(),
            "--buffer-size",
            "0",
        ])
        .unwrap();
        assert!(matches!(
            cli.validate(),
            Err(ConfigError::InvalidValue { option: "buffer-size", .. })
        ));
    }

    #[test]
    fn test_validate_archive_paths() {
        let dir = tempfile::tempdir().expect("Operation should succeed");
        let missing_path = dir.path().join("missing.nsp");

        let missing = Cli::try_parse_from(["nspx", "list", missing_path.to_str().unwrap()]).unwrap();
        assert!(matches!(missing.validate(), Err(ConfigError::MissingFile(_))));

        let directory = Cli::try_parse_from(["nspx", "list", dir.path().to_str().unwrap()]).unwrap();
        assert!(matches!(directory.validate(), Err(ConfigError::NotAFile(_))));
    }
}
