//! Archive reader: open, list, extract, refresh and close
//!
//! A reader owns its store from [`Pfs0Reader::open`] until
//! [`Pfs0Reader::close`] (or drop). Every operation that touches the store
//! seeks to an absolute offset first, so it never relies on where the
//! previous operation left the cursor. At most one operation may be in flight
//! per reader; sharing across threads needs external synchronization.

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use crate::pfs0::file_table::{EntryInfo, FileEntry, FileTable};
use crate::pfs0::header::Pfs0Header;
use crate::pfs0::report::{ReportLevel, SharedReporter, default_reporter};
use crate::pfs0::split::{SplitPolicy, extract_split};
use crate::pfs0::stream::{DEFAULT_BUFFER_SIZE, copy_from_store};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

/// Options for [`Pfs0Reader::extract_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Copy buffer size in bytes
    pub buffer_size: usize,
    /// Split oversized entries into parts instead of single files
    pub split: Option<SplitPolicy>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            split: None,
        }
    }
}

/// Outcome of an extraction
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Entries written, with their destination paths
    pub extracted: Vec<(String, PathBuf)>,
    /// Requested names absent from the archive
    pub missing: Vec<String>,
    /// Entries that failed, with the reason
    pub failed: Vec<(String, Pfs0Error)>,
    /// Later entries skipped because an earlier entry had the same name
    pub duplicates: Vec<String>,
}

impl ExtractReport {
    /// Whether every requested entry was written
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Reader over an open PFS0 store
pub struct Pfs0Reader<R> {
    store: Option<R>,
    header: Pfs0Header,
    table: FileTable,
    reporter: SharedReporter,
}

impl<R> std::fmt::Debug for Pfs0Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pfs0Reader")
            .field("open", &self.store.is_some())
            .field("header", &self.header)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<R: Read + Seek> Pfs0Reader<R> {
    /// Open `store`, reporting through `tracing`
    pub fn open(store: R) -> Pfs0Result<Self> {
        Self::open_with_reporter(store, default_reporter())
    }

    /// Open `store`, reporting through `reporter`
    ///
    /// On failure the store is dropped and nothing is retained.
    pub fn open_with_reporter(mut store: R, reporter: SharedReporter) -> Pfs0Result<Self> {
        match load(&mut store) {
            Ok((header, table)) => Ok(Self {
                store: Some(store),
                header,
                table,
                reporter,
            }),
            Err(e) => {
                reporter.report(ReportLevel::Error, &format!("Cannot open archive: {e}"));
                Err(e)
            }
        }
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.store.is_none()
    }

    /// Decoded header
    pub fn header(&self) -> Pfs0Result<&Pfs0Header> {
        self.ensure_open()?;
        Ok(&self.header)
    }

    /// File table in on-disk order
    pub fn file_table(&self) -> Pfs0Result<&FileTable> {
        self.ensure_open()?;
        Ok(&self.table)
    }

    /// Names and sizes of all entries in table order
    pub fn list(&self) -> Pfs0Result<Vec<EntryInfo>> {
        Ok(self.file_table()?.infos())
    }

    /// Number of entries
    pub fn entry_count(&self) -> Pfs0Result<usize> {
        Ok(self.file_table()?.len())
    }

    /// First entry named `name`
    pub fn entry(&self, name: &str) -> Pfs0Result<&FileEntry> {
        self.file_table()?
            .find(name)
            .ok_or_else(|| Pfs0Error::NotFound(name.to_string()))
    }

    /// Stream the entry named `name` into `sink`
    pub fn copy_entry_to<W: Write + ?Sized>(&mut self, name: &str, sink: &mut W) -> Pfs0Result<u64> {
        let entry = self.entry(name)?.clone();
        let store = self.store.as_mut().ok_or(Pfs0Error::AlreadyClosed)?;
        let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
        copy_from_store(store, entry.absolute_offset, entry.size, sink, &mut buf)
    }

    /// Read the entry named `name` into memory
    pub fn read_entry(&mut self, name: &str) -> Pfs0Result<Vec<u8>> {
        let size = usize::try_from(self.entry(name)?.size)
            .map_err(|_| Pfs0Error::InvalidInput(format!("{name:?} is too large to buffer")))?;
        let mut out = Vec::with_capacity(size);
        self.copy_entry_to(name, &mut out)?;
        Ok(out)
    }

    /// Extract `names` (or every entry, if empty) into `destination`
    pub fn extract<S, P>(&mut self, names: &[S], destination: P) -> Pfs0Result<ExtractReport>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        self.extract_with(names, destination, &ExtractOptions::default())
    }

    /// Extract with explicit options
    ///
    /// Requested names that are absent are reported and skipped. When names
    /// are given, a failure on one entry is recorded and the rest continue.
    /// When extracting everything, a failure of the archive store itself
    /// aborts the run; destination-side failures are recorded and skipped.
    pub fn extract_with<S, P>(
        &mut self,
        names: &[S],
        destination: P,
        options: &ExtractOptions,
    ) -> Pfs0Result<ExtractReport>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        let destination = destination.as_ref();
        let store = self.store.as_mut().ok_or(Pfs0Error::AlreadyClosed)?;
        let reporter = &self.reporter;

        let checked = if options.buffer_size == 0 {
            Err(Pfs0Error::InvalidInput(
                "copy buffer size must be non-zero".to_string(),
            ))
        } else {
            options.split.as_ref().map_or(Ok(()), SplitPolicy::validate)
        };
        if let Err(e) = checked {
            reporter.report(ReportLevel::Error, &format!("Cannot extract: {e}"));
            return Err(e);
        }
        if options.split.is_some() {
            reporter.report(ReportLevel::Info, "Will split large files");
        }

        if !destination.is_dir() {
            reporter.report(
                ReportLevel::Info,
                &format!("Creating output directory '{}'", destination.display()),
            );
            fs::create_dir_all(destination).map_err(|e| {
                reporter.report(
                    ReportLevel::Error,
                    &format!("Cannot create '{}': {e}", destination.display()),
                );
                Pfs0Error::Io(e)
            })?;
        }

        let mut buf = vec![0u8; options.buffer_size];
        let mut report = ExtractReport::default();

        if names.is_empty() {
            let mut written = HashSet::new();
            for entry in self.table.iter() {
                if !written.insert(entry.name.as_str()) {
                    reporter.report(
                        ReportLevel::Warn,
                        &format!("Skipping duplicate entry '{}', keeping the first", entry.name),
                    );
                    report.duplicates.push(entry.name.clone());
                    continue;
                }
                match extract_entry(store, entry, destination, &mut buf, options, reporter) {
                    Ok(path) => report.extracted.push((entry.name.clone(), path)),
                    Err(e) if e.is_store_failure() => {
                        reporter.report(
                            ReportLevel::Error,
                            &format!("Archive read failed at '{}', aborting: {e}", entry.name),
                        );
                        return Err(e);
                    }
                    Err(e) => {
                        reporter.report(
                            ReportLevel::Error,
                            &format!("Could not extract '{}': {e}", entry.name),
                        );
                        report.failed.push((entry.name.clone(), e));
                    }
                }
            }
            return Ok(report);
        }

        let mut seen = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                continue;
            }

            let Some(entry) = self.table.find(name) else {
                reporter.report(
                    ReportLevel::Warn,
                    &format!("File '{name}' does not exist in the archive"),
                );
                report.missing.push(name.to_string());
                continue;
            };

            match extract_entry(store, entry, destination, &mut buf, options, reporter) {
                Ok(path) => report.extracted.push((entry.name.clone(), path)),
                Err(e) => {
                    reporter.report(
                        ReportLevel::Error,
                        &format!("Could not extract '{name}': {e}"),
                    );
                    report.failed.push((name.to_string(), e));
                }
            }
        }

        Ok(report)
    }

    /// Re-read header and file table from the current store contents
    ///
    /// On failure the previous table stays in place.
    pub fn refresh(&mut self) -> Pfs0Result<()> {
        let store = self.store.as_mut().ok_or(Pfs0Error::AlreadyClosed)?;
        match load(store) {
            Ok((header, table)) => {
                self.reporter.report(
                    ReportLevel::Info,
                    &format!("Reloaded header: {} entries", table.len()),
                );
                self.header = header;
                self.table = table;
                Ok(())
            }
            Err(e) => {
                self.reporter.report(
                    ReportLevel::Error,
                    &format!("Refresh failed, keeping previous file table: {e}"),
                );
                Err(e)
            }
        }
    }

    /// Release the store
    ///
    /// Returns `false` (and reports a warning) if the reader was already closed.
    pub fn close(&mut self) -> bool {
        if self.store.take().is_some() {
            self.reporter.report(ReportLevel::Info, "Closing file.");
            self.table = FileTable::default();
            true
        } else {
            self.reporter
                .report(ReportLevel::Warn, "close called on an already closed archive");
            false
        }
    }

    fn ensure_open(&self) -> Pfs0Result<()> {
        if self.store.is_some() {
            Ok(())
        } else {
            Err(Pfs0Error::AlreadyClosed)
        }
    }
}

impl Pfs0Reader<File> {
    /// Open the archive at `path`
    pub fn open_path<P: AsRef<Path>>(path: P) -> Pfs0Result<Self> {
        Self::open_path_with_reporter(path, default_reporter())
    }

    /// Open the archive at `path`, reporting through `reporter`
    pub fn open_path_with_reporter<P: AsRef<Path>>(
        path: P,
        reporter: SharedReporter,
    ) -> Pfs0Result<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            Err(Pfs0Error::InvalidInput(format!(
                "'{}' is not a file",
                path.display()
            )))
        } else {
            File::open(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Pfs0Error::NotFound(path.display().to_string())
                } else {
                    Pfs0Error::Store(e)
                }
            })
        };

        match file {
            Ok(file) => Self::open_with_reporter(file, reporter),
            Err(e) => {
                reporter.report(ReportLevel::Error, &format!("Cannot open archive: {e}"));
                Err(e)
            }
        }
    }
}

fn load<R: Read + Seek>(store: &mut R) -> Pfs0Result<(Pfs0Header, FileTable)> {
    let header = Pfs0Header::decode(store)?;
    let store_len = store.seek(SeekFrom::End(0)).map_err(Pfs0Error::Store)?;
    let table = FileTable::build(&header, store, store_len)?;
    Ok((header, table))
}

/// Destination path for `name`, refusing anything but a plain file name
pub(crate) fn destination_path(dir: &Path, name: &str) -> Pfs0Result<PathBuf> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        return Err(Pfs0Error::UnsafeEntryName(name.to_string()));
    }
    Ok(dir.join(name))
}

fn extract_entry<R: Read + Seek>(
    store: &mut R,
    entry: &FileEntry,
    destination: &Path,
    buf: &mut [u8],
    options: &ExtractOptions,
    reporter: &SharedReporter,
) -> Pfs0Result<PathBuf> {
    let target = destination_path(destination, &entry.name)?;
    reporter.report(ReportLevel::Info, &format!("Extracting '{}'", entry.name));

    if let Some(policy) = options.split.as_ref().filter(|p| p.should_split(entry.size)) {
        if let Err(e) = extract_split(store, entry, &target, policy, &**reporter) {
            if target.exists()
                && let Err(rm) = fs::remove_dir_all(&target)
            {
                reporter.report(
                    ReportLevel::Warn,
                    &format!("Could not remove partial parts '{}': {rm}", target.display()),
                );
            }
            return Err(e);
        }
        return Ok(target);
    }

    let mut out = File::create(&target)?;
    let copied = copy_from_store(store, entry.absolute_offset, entry.size, &mut out, buf)
        .and_then(|n| out.flush().map(|()| n).map_err(Pfs0Error::Io));

    if let Err(e) = copied {
        drop(out);
        if let Err(rm) = fs::remove_file(&target) {
            reporter.report(
                ReportLevel::Warn,
                &format!("Could not remove partial '{}': {rm}", target.display()),
            );
        }
        return Err(e);
    }

    Ok(target)
}
