//! PFS0 header decoding and encoding

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use binrw::{BinRead, BinWrite};
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};

/// PFS0 magic signature
pub const MAGIC: [u8; 4] = *b"PFS0";

/// Size of the fixed prologue (magic, counts, reserved word)
pub const PROLOGUE_SIZE: u64 = 0x10;

/// Size of one entry record
pub const ENTRY_SIZE: u64 = 0x18;

/// The body always starts on this boundary
pub const HEADER_ALIGNMENT: u64 = 0x10;

/// Bytes scanned per read while looking for a name terminator
const NAME_SCAN_CHUNK: usize = 64;

/// Fixed 16-byte prologue at the start of every PFS0 store
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Pfs0Prologue {
    /// Magic signature, always "PFS0"
    pub magic: [u8; 4],
    /// Number of entry records following the prologue
    pub entry_count: u32,
    /// Length of the string table including trailing padding
    pub string_table_size: u32,
    /// Reserved, written as zero and never checked
    pub reserved: u32,
}

/// One 24-byte entry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Pfs0Entry {
    /// Payload offset relative to the body start
    pub data_offset: u64,
    /// Payload length in bytes
    pub data_size: u64,
    /// Offset of the entry name inside the string table
    pub name_offset: u32,
    /// Reserved, written as zero and never checked
    pub reserved: u32,
}

/// Name and payload size of a file about to be packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Basename stored in the string table
    pub name: String,
    /// Payload length in bytes
    pub size: u64,
}

impl FileSpec {
    /// Create a new file spec
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Decoded PFS0 header
///
/// Layout on disk:
///
/// ```text
/// [0x00] Magic "PFS0"                       (4 bytes)
/// [0x04] entry_count                        (u32 LE)
/// [0x08] string_table_size                  (u32 LE)
/// [0x0C] reserved                           (4 bytes)
/// [0x10] entries                            (entry_count x 0x18 bytes)
/// [0x10 + entry_count x 0x18]
///        string table, NUL-terminated names (string_table_size bytes)
/// [body_base]
///        payloads
/// ```
///
/// Names are not resolved here; see [`Pfs0Header::read_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pfs0Header {
    /// Number of entries
    pub entry_count: u32,
    /// String table length including padding
    pub string_table_size: u32,
    /// Entry records in on-disk order
    pub entries: Vec<Pfs0Entry>,
}

/// Offset of the string table for a header with `entry_count` entries
pub fn string_table_base(entry_count: u32) -> u64 {
    PROLOGUE_SIZE + ENTRY_SIZE * u64::from(entry_count)
}

/// Number of zero bytes needed to bring `len` up to the header alignment
pub fn alignment_padding(len: u64) -> u64 {
    (HEADER_ALIGNMENT - len % HEADER_ALIGNMENT) % HEADER_ALIGNMENT
}

impl Pfs0Header {
    /// Decode the header from the start of `reader`
    ///
    /// The store is rewound first; the prior cursor position is irrelevant.
    pub fn decode<R: Read + Seek>(reader: &mut R) -> Pfs0Result<Self> {
        let store_len = reader.seek(SeekFrom::End(0)).map_err(Pfs0Error::Store)?;
        reader.seek(SeekFrom::Start(0)).map_err(Pfs0Error::Store)?;

        let mut raw = [0u8; PROLOGUE_SIZE as usize];
        let filled = read_prefix(reader, &mut raw)?;

        // Stores shorter than the magic report what they hold, zero padded
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&raw[..4]);
        if filled < MAGIC.len() || magic != MAGIC {
            return Err(Pfs0Error::InvalidMagic(magic));
        }
        if filled < raw.len() {
            return Err(Pfs0Error::malformed(format!(
                "store holds {filled} bytes, shorter than the {PROLOGUE_SIZE}-byte prologue"
            )));
        }

        let prologue = Pfs0Prologue::read(&mut Cursor::new(&raw))?;

        let table_base = string_table_base(prologue.entry_count);
        if table_base > store_len {
            return Err(Pfs0Error::malformed(format!(
                "{} entries need {table_base} header bytes but the store holds {store_len}",
                prologue.entry_count
            )));
        }
        let body_base = table_base + u64::from(prologue.string_table_size);
        if body_base > store_len {
            return Err(Pfs0Error::malformed(format!(
                "string table ends at {body_base} past end of store ({store_len})"
            )));
        }

        // Bounded by the store length check above.
        let mut entries = Vec::with_capacity(prologue.entry_count as usize);
        for _ in 0..prologue.entry_count {
            entries.push(Pfs0Entry::read(reader)?);
        }

        tracing::debug!(
            entry_count = prologue.entry_count,
            string_table_size = prologue.string_table_size,
            body_base,
            "decoded PFS0 header"
        );

        Ok(Self {
            entry_count: prologue.entry_count,
            string_table_size: prologue.string_table_size,
            entries,
        })
    }

    /// Compute the header for `files`, laid out back-to-back in input order
    ///
    /// Returns the header and the padded string table bytes.
    pub fn from_files(files: &[FileSpec]) -> Pfs0Result<(Self, Vec<u8>)> {
        let entry_count = u32::try_from(files.len())
            .map_err(|_| Pfs0Error::InvalidInput(format!("too many files: {}", files.len())))?;

        let mut string_table = Vec::new();
        let mut entries = Vec::with_capacity(files.len());
        let mut data_offset: u64 = 0;

        for file in files {
            if file.name.is_empty() {
                return Err(Pfs0Error::InvalidInput("empty file name".to_string()));
            }
            if file.name.as_bytes().contains(&0) {
                return Err(Pfs0Error::InvalidInput(format!(
                    "file name contains NUL: {:?}",
                    file.name
                )));
            }

            let name_offset = u32::try_from(string_table.len()).map_err(|_| {
                Pfs0Error::InvalidInput("string table exceeds 4 GiB".to_string())
            })?;
            string_table.extend_from_slice(file.name.as_bytes());
            string_table.push(0);

            entries.push(Pfs0Entry {
                data_offset,
                data_size: file.size,
                name_offset,
                reserved: 0,
            });

            data_offset = data_offset.checked_add(file.size).ok_or_else(|| {
                Pfs0Error::InvalidInput("total payload size overflows u64".to_string())
            })?;
        }

        let unpadded = string_table_base(entry_count) + string_table.len() as u64;
        let padding = alignment_padding(unpadded);
        string_table.resize(string_table.len() + padding as usize, 0);

        let string_table_size = u32::try_from(string_table.len())
            .map_err(|_| Pfs0Error::InvalidInput("string table exceeds 4 GiB".to_string()))?;

        tracing::debug!(
            entry_count,
            string_table_size,
            padding,
            "generated PFS0 header"
        );

        Ok((
            Self {
                entry_count,
                string_table_size,
                entries,
            },
            string_table,
        ))
    }

    /// Serialize prologue, entries and the given string table
    pub fn to_bytes(&self, string_table: &[u8]) -> Pfs0Result<Vec<u8>> {
        if string_table.len() != self.string_table_size as usize {
            return Err(Pfs0Error::InvalidInput(format!(
                "string table is {} bytes, header declares {}",
                string_table.len(),
                self.string_table_size
            )));
        }

        let mut cursor = Cursor::new(Vec::with_capacity(self.body_base() as usize));
        Pfs0Prologue {
            magic: MAGIC,
            entry_count: self.entry_count,
            string_table_size: self.string_table_size,
            reserved: 0,
        }
        .write(&mut cursor)
        .map_err(Pfs0Error::BinRw)?;

        for entry in &self.entries {
            entry.write(&mut cursor).map_err(Pfs0Error::BinRw)?;
        }

        let mut bytes = cursor.into_inner();
        bytes.extend_from_slice(string_table);
        Ok(bytes)
    }

    /// Offset of the string table from the start of the store
    pub fn string_table_base(&self) -> u64 {
        string_table_base(self.entry_count)
    }

    /// Offset of the body (first payload byte) from the start of the store
    pub fn body_base(&self) -> u64 {
        self.string_table_base() + u64::from(self.string_table_size)
    }

    /// Read the NUL-terminated name at `name_offset` in the string table
    ///
    /// The scan never runs past the end of the string table.
    pub fn read_name<R: Read + Seek>(&self, reader: &mut R, name_offset: u32) -> Pfs0Result<String> {
        if name_offset >= self.string_table_size {
            return Err(Pfs0Error::malformed(format!(
                "name offset {name_offset} outside string table of {} bytes",
                self.string_table_size
            )));
        }

        reader
            .seek(SeekFrom::Start(
                self.string_table_base() + u64::from(name_offset),
            ))
            .map_err(Pfs0Error::Store)?;

        let limit = u64::from(self.string_table_size - name_offset);
        let mut bounded = reader.take(limit);
        let mut name = Vec::new();
        let mut chunk = [0u8; NAME_SCAN_CHUNK];

        loop {
            let n = match bounded.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Pfs0Error::Store(e)),
            };
            if n == 0 {
                return Err(Pfs0Error::TruncatedName {
                    offset: name_offset,
                });
            }
            if let Some(end) = chunk[..n].iter().position(|&b| b == 0) {
                name.extend_from_slice(&chunk[..end]);
                return Ok(String::from_utf8(name)?);
            }
            name.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Encode a complete header (prologue, entries, padded string table) for `files`
pub fn encode(files: &[FileSpec]) -> Pfs0Result<Vec<u8>> {
    let (header, string_table) = Pfs0Header::from_files(files)?;
    header.to_bytes(&string_table)
}

/// Fill as much of `buf` as the store holds, returning the byte count
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Pfs0Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Pfs0Error::Store(e)),
        }
    }
    Ok(filled)
}
