//! In-memory index of the files stored in a PFS0 archive

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use crate::pfs0::header::Pfs0Header;
use std::io::{Read, Seek};

/// A resolved archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name from the string table
    pub name: String,
    /// Payload length in bytes
    pub size: u64,
    /// Payload offset from the start of the store
    pub absolute_offset: u64,
}

impl FileEntry {
    /// Offset one past the last payload byte
    pub fn end_offset(&self) -> u64 {
        self.absolute_offset + self.size
    }
}

/// Name and size of an entry, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name
    pub name: String,
    /// Payload length in bytes
    pub size: u64,
}

/// Ordered file table, in on-disk entry order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTable {
    entries: Vec<FileEntry>,
}

impl FileTable {
    /// Resolve every entry of `header` against the string table in `reader`
    ///
    /// `store_len` bounds payload ranges; an entry whose payload would run
    /// past the end of the store makes the header malformed.
    pub fn build<R: Read + Seek>(
        header: &Pfs0Header,
        reader: &mut R,
        store_len: u64,
    ) -> Pfs0Result<Self> {
        let body_base = header.body_base();
        let mut entries = Vec::with_capacity(header.entries.len());

        for raw in &header.entries {
            let name = header.read_name(reader, raw.name_offset)?;

            let absolute_offset = body_base.checked_add(raw.data_offset).ok_or_else(|| {
                Pfs0Error::malformed(format!("data offset of {name:?} overflows"))
            })?;
            let end = absolute_offset.checked_add(raw.data_size);
            if end.is_none_or(|end| end > store_len) {
                return Err(Pfs0Error::malformed(format!(
                    "payload of {name:?} ({} bytes at {absolute_offset}) runs past end of store ({store_len})",
                    raw.data_size
                )));
            }

            entries.push(FileEntry {
                name,
                size: raw.data_size,
                absolute_offset,
            });
        }

        Ok(Self { entries })
    }

    /// First entry named `name`; duplicate names resolve to the earliest
    pub fn find(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entry at table position `index`
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// Iterate entries in table order
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and sizes in table order
    pub fn infos(&self) -> Vec<EntryInfo> {
        self.entries
            .iter()
            .map(|e| EntryInfo {
                name: e.name.clone(),
                size: e.size,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FileTable {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
