//! Bounded-buffer copy between a byte store and a sink

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Default copy buffer size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Which side of a copy failed
#[derive(Debug)]
pub enum CopyError {
    /// Reading from the source failed or hit end of data early
    Source(io::Error),
    /// Writing to the sink failed
    Sink(io::Error),
}

/// Copy exactly `len` bytes from `source` to `sink` through `buf`
///
/// Reads are never larger than the bytes still owed, so the copy stops at
/// `len` even when the source holds more data. A source that ends early is
/// reported as `CopyError::Source` with `UnexpectedEof`.
pub fn copy_exact<R: Read + ?Sized, W: Write + ?Sized>(
    source: &mut R,
    sink: &mut W,
    len: u64,
    buf: &mut [u8],
) -> Result<u64, CopyError> {
    if buf.is_empty() && len > 0 {
        return Err(CopyError::Source(io::Error::new(
            io::ErrorKind::InvalidInput,
            "copy buffer is empty",
        )));
    }

    let mut remaining = len;
    while remaining > 0 {
        let step = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        source
            .read_exact(&mut buf[..step])
            .map_err(CopyError::Source)?;
        sink.write_all(&buf[..step]).map_err(CopyError::Sink)?;
        remaining -= step as u64;
    }

    Ok(len)
}

/// Copy `len` bytes starting at absolute `offset` in an archive store
///
/// Source-side failures become [`Pfs0Error::Store`], sink-side failures
/// [`Pfs0Error::Io`].
pub(crate) fn copy_from_store<R, W>(
    store: &mut R,
    offset: u64,
    len: u64,
    sink: &mut W,
    buf: &mut [u8],
) -> Pfs0Result<u64>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    store
        .seek(SeekFrom::Start(offset))
        .map_err(Pfs0Error::Store)?;
    copy_exact(store, sink, len, buf).map_err(|e| match e {
        CopyError::Source(e) => Pfs0Error::Store(e),
        CopyError::Sink(e) => Pfs0Error::Io(e),
    })
}
