//! Subcommand handlers.
//!
//! Progress messages go through the archive reporter (and from there to
//! `tracing`); only the command's actual output is written to `out`.

use crate::config::{Cli, Command};
use crate::error::CliError;
use anyhow::{Context, Result};
use nspx_formats::pfs0::{EntryInfo, ExtractOptions, Pfs0Builder, Pfs0Reader, SplitPolicy};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run the parsed command, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::List { archive } => list(archive, out),
        Command::Extract {
            archive,
            names,
            output,
            split,
        } => {
            let destination = output
                .clone()
                .unwrap_or_else(|| default_output_dir(archive));
            let options = ExtractOptions {
                buffer_size: cli.buffer_size,
                split: split.then(SplitPolicy::default),
            };
            extract(archive, names, &destination, &options, out)
        }
        Command::Create { output, files } => create(output, files, cli.buffer_size, out),
    }
}

fn list(archive: &Path, out: &mut dyn Write) -> Result<()> {
    let reader = Pfs0Reader::open_path(archive)
        .with_context(|| format!("Failed to open '{}'", archive.display()))?;
    let entries = reader.list()?;
    out.write_all(format_listing(archive, &entries).as_bytes())?;
    Ok(())
}

fn extract(
    archive: &Path,
    names: &[String],
    destination: &Path,
    options: &ExtractOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let mut reader = Pfs0Reader::open_path(archive)
        .with_context(|| format!("Failed to open '{}'", archive.display()))?;
    let report = reader
        .extract_with(names, destination, options)
        .with_context(|| format!("Failed to extract '{}'", archive.display()))?;
    reader.close();

    info!(
        "Extracted {} entries into '{}'",
        report.extracted.len(),
        destination.display()
    );

    if !report.is_complete() {
        return Err(CliError::IncompleteExtraction {
            missing: report.missing.len(),
            failed: report.failed.len(),
        }
        .into());
    }

    writeln!(out, "Done!")?;
    Ok(())
}

fn create(output: &Path, files: &[PathBuf], buffer_size: usize, out: &mut dyn Write) -> Result<()> {
    let mut reader = Pfs0Builder::new()
        .with_buffer_size(buffer_size)
        .add_files(files)
        .create(output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;
    let count = reader.entry_count()?;
    reader.close();

    writeln!(out, "Created '{}' with {count} entries", output.display())?;
    Ok(())
}

/// Listing text: a heading, then one tab-indented line per entry.
///
/// Names are left-justified to one column past the longest name.
pub fn format_listing(archive: &Path, entries: &[EntryInfo]) -> String {
    let width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        + 1;

    let mut text = format!("Contents of '{}':\n", archive.display());
    for entry in entries {
        let _ = writeln!(text, "\t{:<width$}: {} bytes", entry.name, entry.size);
    }
    text
}

/// Default extraction directory: the archive path without its extension.
///
/// An archive without an extension gets a `_files` suffix instead, so the
/// directory never collides with the archive itself.
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let stripped = archive.with_extension("");
    if stripped == archive {
        let mut name = archive.as_os_str().to_owned();
        name.push("_files");
        PathBuf::from(name)
    } else {
        stripped
    }
}
