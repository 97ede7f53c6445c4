//! Split extraction of oversized entries
//!
//! Filesystems such as FAT32 cannot hold files of 4 GiB or more. Entries above
//! the policy threshold are written as numbered parts (`00`, `01`, ...) inside
//! a directory named after the entry. Every part except the last holds exactly
//! `part_size` bytes, so concatenating the parts in name order reproduces the
//! entry. Parts are never re-joined automatically.

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use crate::pfs0::file_table::FileEntry;
use crate::pfs0::report::{ReportLevel, Reporter};
use crate::pfs0::stream::copy_from_store;
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Largest file a FAT32 volume can store
pub const FAT32_MAX_FILE_SIZE: u64 = 0xFFFF_FFFF;

/// Default size of one part (4 GiB minus 64 KiB)
pub const DEFAULT_PART_SIZE: u64 = 0xFFFF_0000;

/// Default copy chunk while writing parts
pub const DEFAULT_CHUNK_SIZE: usize = 0x8000;

/// When and how to split entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPolicy {
    /// Entries strictly larger than this are split
    pub threshold: u64,
    /// Bytes per part
    pub part_size: u64,
    /// Copy buffer size
    pub chunk_size: usize,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            threshold: FAT32_MAX_FILE_SIZE,
            part_size: DEFAULT_PART_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SplitPolicy {
    /// Whether an entry of `size` bytes should be split
    pub fn should_split(&self, size: u64) -> bool {
        size > self.threshold
    }

    /// Number of parts an entry of `size` bytes produces
    pub fn part_count(&self, size: u64) -> u64 {
        size.div_ceil(self.part_size).max(1)
    }

    /// Reject policies that cannot make progress
    pub fn validate(&self) -> Pfs0Result<()> {
        if self.part_size == 0 {
            return Err(Pfs0Error::InvalidInput(
                "split part size must be non-zero".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Pfs0Error::InvalidInput(
                "split chunk size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Path of part `index` inside `dir`
pub fn part_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{index:02}"))
}

/// Write `entry` from `store` as numbered parts inside `dir`
///
/// An existing `dir` is replaced. Returns the part paths in order.
pub fn extract_split<R: Read + Seek + ?Sized>(
    store: &mut R,
    entry: &FileEntry,
    dir: &Path,
    policy: &SplitPolicy,
    reporter: &dyn Reporter,
) -> Pfs0Result<Vec<PathBuf>> {
    policy.validate()?;

    if dir.is_dir() {
        fs::remove_dir_all(dir)?;
    } else if dir.exists() {
        fs::remove_file(dir)?;
    }
    fs::create_dir_all(dir)?;

    let parts = policy.part_count(entry.size);
    reporter.report(
        ReportLevel::Info,
        &format!("Will split '{}' into {parts} parts", entry.name),
    );

    let mut buf = vec![0u8; policy.chunk_size];
    let mut paths = Vec::new();
    let mut offset = entry.absolute_offset;
    let mut remaining = entry.size;

    for index in 0..parts {
        reporter.report(
            ReportLevel::Info,
            &format!("Extracting part {} of {parts}", index + 1),
        );

        let len = remaining.min(policy.part_size);
        let path = part_path(dir, index);
        let mut out = File::create(&path)?;
        copy_from_store(store, offset, len, &mut out, &mut buf)?;

        offset += len;
        remaining -= len;
        paths.push(path);
    }

    reporter.report(
        ReportLevel::Info,
        &format!("Extracted all {parts} parts of '{}'", entry.name),
    );

    Ok(paths)
}
