//! Error types for PFS0 operations

use std::path::PathBuf;
use thiserror::Error;

/// PFS0 operation result type
pub type Pfs0Result<T> = Result<T, Pfs0Error>;

/// Errors that can occur while reading, extracting or building PFS0 archives
#[derive(Debug, Error)]
pub enum Pfs0Error {
    /// The first four bytes of the store are not `PFS0`
    #[error("Invalid PFS0 magic: expected 'PFS0', got {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// Fixed header fields are truncated or inconsistent
    #[error("Malformed PFS0 header: {reason}")]
    MalformedHeader {
        /// Description of the structural problem
        reason: String,
    },

    /// No NUL terminator before the end of the string table
    #[error("Truncated name at string table offset {offset}")]
    TruncatedName {
        /// Offset of the name inside the string table
        offset: u32,
    },

    /// A name in the string table is not valid UTF-8
    #[error("Invalid entry name: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),

    /// Path or entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation attempted on a closed archive handle
    #[error("Archive handle is already closed")]
    AlreadyClosed,

    /// I/O failure on the archive store itself
    #[error("Archive store I/O error: {0}")]
    Store(#[source] std::io::Error),

    /// I/O failure on a destination or source file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation is deliberately not supported
    #[error("Unimplemented: {0}")]
    Unimplemented(&'static str),

    /// An input file for archive creation does not exist
    #[error("Source file missing: {}", .0.display())]
    SourceFileMissing(PathBuf),

    /// An input file changed size while the archive was being written
    #[error("Source file changed while packing: {}", path.display())]
    SourceChanged {
        /// Path of the changed file
        path: PathBuf,
    },

    /// Entry name would escape the extraction directory
    #[error("Unsafe entry name: {0:?}")]
    UnsafeEntryName(String),

    /// Input that cannot be represented in the on-disk field widths
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `BinRW` parsing/writing error
    #[error("Binary format error: {0}")]
    BinRw(binrw::Error),
}

impl Pfs0Error {
    /// Check if this error describes a structurally broken archive
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic(_)
                | Self::MalformedHeader { .. }
                | Self::TruncatedName { .. }
                | Self::InvalidName(_)
        )
    }

    /// Check if this error came from the archive store rather than a destination
    ///
    /// A failing store is likely to fail every later read as well, so bulk
    /// extraction stops on these.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }
}

impl From<binrw::Error> for Pfs0Error {
    fn from(err: binrw::Error) -> Self {
        match err {
            // Derived readers wrap field errors with the parse context
            binrw::Error::Backtrace(bt) => Self::from(*bt.error),
            binrw::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::malformed("unexpected end of data in fixed header fields")
            }
            binrw::Error::Io(io) => Self::Store(io),
            other => Self::BinRw(other),
        }
    }
}
