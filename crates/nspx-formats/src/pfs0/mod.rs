//! PFS0 (PartitionFS) flat archive container
//!
//! PFS0 is the outer container of NSP packages: a fixed header indexing a set
//! of files by name, followed by their payloads back to back. There is no
//! compression, no directory structure and no per-file metadata beyond name
//! and size.
//!
//! # Binary Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! [0x00] "PFS0"                                        4 bytes
//! [0x04] entry_count                                   u32
//! [0x08] string_table_size (incl. padding)             u32
//! [0x0C] reserved                                      4 bytes
//! [0x10] entry_count x { data_offset u64, data_size u64,
//!                        name_offset u32, reserved u32 }
//!        string table: NUL-terminated names, zero padded so the
//!        body starts on a 16-byte boundary
//!        body: payloads, data_offset relative to the body start
//! ```
//!
//! # Usage Examples
//!
//! ## List and extract
//!
//! ```rust,no_run
//! use nspx_formats::pfs0::Pfs0Reader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = Pfs0Reader::open_path("title.nsp")?;
//! for entry in reader.list()? {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//!
//! let report = reader.extract(&["program.nca"], "title")?;
//! for name in &report.missing {
//!     eprintln!("not in archive: {name}");
//! }
//! reader.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Encode a header
//!
//! ```rust
//! use nspx_formats::pfs0::{FileSpec, encode};
//!
//! let header = encode(&[FileSpec::new("a.bin", 5), FileSpec::new("b.bin", 0)])?;
//! assert_eq!(&header[..4], b"PFS0");
//! assert_eq!(header.len() % 16, 0);
//! # Ok::<(), nspx_formats::pfs0::Pfs0Error>(())
//! ```

mod builder;
mod error;
mod file_table;
mod header;
mod reader;
mod report;
mod split;
mod stream;

pub use builder::{Pfs0Builder, create_archive};
pub use error::{Pfs0Error, Pfs0Result};
pub use file_table::{EntryInfo, FileEntry, FileTable};
pub use header::{
    ENTRY_SIZE, FileSpec, HEADER_ALIGNMENT, MAGIC, PROLOGUE_SIZE, Pfs0Entry, Pfs0Header,
    Pfs0Prologue, alignment_padding, encode, string_table_base,
};
pub use reader::{ExtractOptions, ExtractReport, Pfs0Reader};
pub use report::{
    NullReporter, ReportLevel, Reporter, SharedReporter, TracingReporter, default_reporter,
};
pub use split::{
    DEFAULT_CHUNK_SIZE, DEFAULT_PART_SIZE, FAT32_MAX_FILE_SIZE, SplitPolicy, extract_split,
    part_path,
};
pub use stream::{CopyError, DEFAULT_BUFFER_SIZE, copy_exact};
