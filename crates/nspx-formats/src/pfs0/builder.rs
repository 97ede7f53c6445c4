//! PFS0 archive builder
//!
//! The builder writes a complete archive in one pass: the header computed
//! from the basenames and sizes of the sources, then each source's bytes in
//! input order with no gaps. Creation is all-or-nothing; any failure after the
//! destination was created removes it again.
//!
//! # Example
//!
//! ```rust,no_run
//! use nspx_formats::pfs0::Pfs0Builder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = Pfs0Builder::new()
//!     .add_file("program.nca")
//!     .add_file("control.nca")
//!     .create("title.nsp")?;
//!
//! for entry in reader.list()? {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

use crate::pfs0::error::{Pfs0Error, Pfs0Result};
use crate::pfs0::header::{FileSpec, encode};
use crate::pfs0::reader::Pfs0Reader;
use crate::pfs0::report::{ReportLevel, SharedReporter, default_reporter};
use crate::pfs0::stream::{CopyError, DEFAULT_BUFFER_SIZE, copy_exact};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Builder for PFS0 archives
pub struct Pfs0Builder {
    sources: Vec<PathBuf>,
    buffer_size: usize,
    reporter: SharedReporter,
}

impl std::fmt::Debug for Pfs0Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pfs0Builder")
            .field("sources", &self.sources)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

impl Default for Pfs0Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pfs0Builder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            reporter: default_reporter(),
        }
    }

    /// Append one source file; archive order follows insertion order
    #[must_use]
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    /// Append several source files
    #[must_use]
    pub fn add_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the copy buffer size
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Report through `reporter` instead of `tracing`
    #[must_use]
    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Source paths in archive order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Validate the sources and collect their basenames and sizes
    ///
    /// Fails with `SourceFileMissing` on the first path that is not an
    /// existing regular file.
    pub fn file_specs(&self) -> Pfs0Result<Vec<FileSpec>> {
        let mut specs = Vec::with_capacity(self.sources.len());
        let mut names = HashSet::new();

        for path in &self.sources {
            let metadata = match fs::metadata(path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => return Err(Pfs0Error::SourceFileMissing(path.clone())),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(Pfs0Error::SourceFileMissing(path.clone()));
                }
                Err(e) => return Err(Pfs0Error::Io(e)),
            };

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Pfs0Error::InvalidInput(format!(
                        "'{}' has no UTF-8 file name",
                        path.display()
                    ))
                })?
                .to_string();

            if !names.insert(name.clone()) {
                self.reporter.report(
                    ReportLevel::Warn,
                    &format!("Duplicate name '{name}'; lookups will resolve to the first"),
                );
            }

            specs.push(FileSpec::new(name, metadata.len()));
        }

        Ok(specs)
    }

    /// Write the archive to `sink`, returning the number of bytes written
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Pfs0Result<u64> {
        let specs = self.file_specs()?;
        self.write_specs(&specs, sink)
    }

    /// Create the archive at `destination` and open it for reading
    pub fn create<P: AsRef<Path>>(&self, destination: P) -> Pfs0Result<Pfs0Reader<File>> {
        let destination = destination.as_ref();
        self.reporter.report(
            ReportLevel::Info,
            &format!("Creating file '{}'...", destination.display()),
        );

        let specs = self.file_specs().inspect_err(|e| self.report_failure(e))?;
        self.check_destination(destination)
            .inspect_err(|e| self.report_failure(e))?;

        let file = File::create(destination).map_err(|e| {
            let err = Pfs0Error::Io(e);
            self.report_failure(&err);
            err
        })?;

        let mut out = BufWriter::new(file);
        let written = self
            .write_specs(&specs, &mut out)
            .and_then(|n| out.flush().map(|()| n).map_err(Pfs0Error::Io));

        if let Err(e) = written {
            drop(out);
            self.report_failure(&e);
            if let Err(rm) = fs::remove_file(destination) {
                self.reporter.report(
                    ReportLevel::Error,
                    &format!(
                        "Could not remove partial archive '{}': {rm}",
                        destination.display()
                    ),
                );
            }
            return Err(e);
        }
        drop(out);

        self.reporter.report(ReportLevel::Info, "Done!");
        Pfs0Reader::open_path_with_reporter(destination, self.reporter.clone())
    }

    /// Add sources to an existing archive
    ///
    /// Rewriting an archive in place is not supported; this always fails
    /// without touching `archive`.
    pub fn append_to<P: AsRef<Path>>(&self, archive: P) -> Pfs0Result<Pfs0Reader<File>> {
        let err = Pfs0Error::Unimplemented("appending to an existing archive");
        self.reporter.report(
            ReportLevel::Error,
            &format!("Cannot update '{}': {err}", archive.as_ref().display()),
        );
        Err(err)
    }

    fn write_specs<W: Write + ?Sized>(&self, specs: &[FileSpec], sink: &mut W) -> Pfs0Result<u64> {
        if self.buffer_size == 0 {
            return Err(Pfs0Error::InvalidInput(
                "copy buffer size must be non-zero".to_string(),
            ));
        }

        self.reporter
            .report(ReportLevel::Info, "Generating header...");
        let header = encode(specs)?;
        sink.write_all(&header)?;
        let mut written = header.len() as u64;

        let mut buf = vec![0u8; self.buffer_size];
        for (path, spec) in self.sources.iter().zip(specs) {
            self.reporter.report(
                ReportLevel::Info,
                &format!("Appending '{}'...", path.display()),
            );
            written += copy_source(path, spec.size, sink, &mut buf)?;
        }

        Ok(written)
    }

    fn check_destination(&self, destination: &Path) -> Pfs0Result<()> {
        if destination.is_dir() {
            return Err(Pfs0Error::InvalidInput(format!(
                "destination '{}' is a directory",
                destination.display()
            )));
        }
        let Ok(target) = destination.canonicalize() else {
            return Ok(());
        };
        for source in &self.sources {
            if source.canonicalize().is_ok_and(|s| s == target) {
                return Err(Pfs0Error::InvalidInput(format!(
                    "destination '{}' is also a source",
                    destination.display()
                )));
            }
        }
        Ok(())
    }

    fn report_failure(&self, err: &Pfs0Error) {
        self.reporter
            .report(ReportLevel::Error, &format!("Archive creation failed: {err}"));
    }
}

/// Create `destination` from `sources` with default settings
pub fn create_archive<P, I, Q>(destination: P, sources: I) -> Pfs0Result<Pfs0Reader<File>>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Q>,
    Q: Into<PathBuf>,
{
    Pfs0Builder::new().add_files(sources).create(destination)
}

/// Copy exactly `size` bytes of `path` into `sink`
fn copy_source<W: Write + ?Sized>(
    path: &Path,
    size: u64,
    sink: &mut W,
    buf: &mut [u8],
) -> Pfs0Result<u64> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Pfs0Error::SourceFileMissing(path.to_path_buf())
        } else {
            Pfs0Error::Io(e)
        }
    })?;

    copy_exact(&mut file, sink, size, buf).map_err(|e| match e {
        CopyError::Source(e) if e.kind() == ErrorKind::UnexpectedEof => Pfs0Error::SourceChanged {
            path: path.to_path_buf(),
        },
        CopyError::Source(e) | CopyError::Sink(e) => Pfs0Error::Io(e),
    })?;

    // Growth after the header was computed would shift every later payload.
    let mut probe = [0u8; 1];
    if file.read(&mut probe)? != 0 {
        return Err(Pfs0Error::SourceChanged {
            path: path.to_path_buf(),
        });
    }

    Ok(size)
}
