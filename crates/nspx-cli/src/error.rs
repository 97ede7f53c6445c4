//! Error types for the `nspx` command.

use nspx_formats::pfs0::Pfs0Error;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Input path does not exist
    #[error("'{}' does not exist", .0.display())]
    MissingFile(PathBuf),

    /// Input path exists but is not a regular file
    #[error("'{}' is not a file", .0.display())]
    NotAFile(PathBuf),

    /// Option value out of range
    #[error("Invalid value for --{option}: {reason}")]
    InvalidValue {
        /// Long option name
        option: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Command outcome errors that are not library failures.
#[derive(Debug, Error)]
pub enum CliError {
    /// Some requested entries were missing or could not be written
    #[error("Extraction incomplete: {missing} missing, {failed} failed")]
    IncompleteExtraction {
        /// Requested names absent from the archive
        missing: usize,
        /// Entries whose extraction failed
        failed: usize,
    },
}

/// Process exit code for a failed run.
///
/// `2` means an input path was unusable, `3` means the archive was malformed
/// or not every requested entry was extracted, `1` covers everything else.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(config) = err.downcast_ref::<ConfigError>() {
        return match config {
            ConfigError::MissingFile(_) | ConfigError::NotAFile(_) => 2,
            ConfigError::InvalidValue { .. } => 1,
        };
    }
    if err.downcast_ref::<CliError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<Pfs0Error>() {
        Some(Pfs0Error::NotFound(_) | Pfs0Error::SourceFileMissing(_)) => 2,
        Some(e) if e.is_format_error() => 3,
        _ => 1,
    }
}
