#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for PFS0 archive creation, listing and extraction
//!
//! Archives are built from real files in a scratch directory, then reopened
//! from disk and extracted again.

use nspx_formats::pfs0::{
    DEFAULT_BUFFER_SIZE, EntryInfo, ExtractOptions, HEADER_ALIGNMENT, NullReporter, Pfs0Builder,
    Pfs0Error, Pfs0Header, Pfs0Reader, SharedReporter, create_archive,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn quiet() -> SharedReporter {
    Arc::new(NullReporter)
}

fn write_sources(dir: &Path, files: &[(&str, Vec<u8>)]) -> Vec<PathBuf> {
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    files
        .iter()
        .map(|(name, data)| {
            let path = src.join(name);
            fs::write(&path, data).unwrap();
            path
        })
        .collect()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

// --- Concrete two-file scenario ---

#[test]
fn pfs0_two_file_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_sources(
        dir.path(),
        &[("a.bin", vec![1, 2, 3, 4, 5]), ("b.bin", Vec::new())],
    );
    let dest = dir.path().join("pair.nsp");

    let mut reader = Pfs0Builder::new()
        .with_reporter(quiet())
        .add_files(&sources)
        .create(&dest)
        .expect("Operation should succeed");

    let raw = fs::read(&dest).unwrap();
    assert_eq!(&raw[0..4], b"PFS0");
    assert_eq!(u32::from_le_bytes(raw[4..8].try_into().unwrap()), 2);
    assert_eq!(u32::from_le_bytes(raw[8..12].try_into().unwrap()), 16);
    assert_eq!(&raw[64..80], b"a.bin\0b.bin\0\0\0\0\0");
    assert_eq!(&raw[80..], &[1u8, 2, 3, 4, 5]);

    let header = reader.header().unwrap();
    assert_eq!(header.entries[0].data_offset, 0);
    assert_eq!(header.entries[0].data_size, 5);
    assert_eq!(header.entries[0].name_offset, 0);
    assert_eq!(header.entries[1].data_offset, 5);
    assert_eq!(header.entries[1].data_size, 0);
    assert_eq!(header.entries[1].name_offset, 6);

    assert_eq!(
        reader.list().unwrap(),
        vec![
            EntryInfo {
                name: "a.bin".to_string(),
                size: 5
            },
            EntryInfo {
                name: "b.bin".to_string(),
                size: 0
            },
        ]
    );

    let out = dir.path().join("out");
    let report = reader.extract(&["b.bin"], &out).unwrap();
    assert!(report.is_complete());
    let extracted = out.join("b.bin");
    assert!(extracted.is_file());
    assert_eq!(fs::metadata(&extracted).unwrap().len(), 0);
    assert!(!out.join("a.bin").exists());
}

// --- Round trip through disk ---

#[test]
fn pfs0_round_trip_extract_all() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        ("program.nca", pattern(10_000, 1)),
        ("control.nca", pattern(4096, 2)),
        ("empty.tik", Vec::new()),
        ("meta.cnmt.nca", pattern(1, 3)),
    ];
    let sources = write_sources(dir.path(), &files);
    let dest = dir.path().join("title.nsp");

    let mut reader = create_archive(&dest, &sources).expect("Operation should succeed");
    reader.close();

    let mut reader = Pfs0Reader::open_path_with_reporter(&dest, quiet()).unwrap();
    let out = dir.path().join("title");
    let report = reader.extract::<&str, _>(&[], &out).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.extracted.len(), files.len());
    for (name, data) in &files {
        assert_eq!(&fs::read(out.join(name)).unwrap(), data, "{name} differs");
    }
}

#[test]
fn pfs0_chunk_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        ("exact", pattern(DEFAULT_BUFFER_SIZE, 7)),
        ("under", pattern(DEFAULT_BUFFER_SIZE - 1, 8)),
        ("over", pattern(DEFAULT_BUFFER_SIZE + 1, 9)),
        ("double", pattern(DEFAULT_BUFFER_SIZE * 2, 10)),
    ];
    let sources = write_sources(dir.path(), &files);
    let dest = dir.path().join("chunks.nsp");

    let mut reader = Pfs0Builder::new()
        .with_reporter(quiet())
        .add_files(&sources)
        .create(&dest)
        .unwrap();

    let out = dir.path().join("out");
    reader.extract::<&str, _>(&[], &out).unwrap();
    for (name, data) in &files {
        let got = fs::read(out.join(name)).unwrap();
        assert_eq!(got.len(), data.len(), "{name} length");
        assert_eq!(&got, data, "{name} content");
    }

    // Same entries through a small odd buffer
    let odd = dir.path().join("odd");
    let options = ExtractOptions {
        buffer_size: 13,
        split: None,
    };
    reader
        .extract_with::<&str, _>(&[], &odd, &options)
        .unwrap();
    for (name, data) in &files {
        assert_eq!(&fs::read(odd.join(name)).unwrap(), data, "{name} content");
    }
}

#[test]
fn pfs0_duplicate_names_resolve_to_first() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("one");
    let second = dir.path().join("two");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    fs::write(first.join("dup.bin"), b"first").unwrap();
    fs::write(second.join("dup.bin"), b"second!").unwrap();

    let dest = dir.path().join("dup.nsp");
    let mut reader = Pfs0Builder::new()
        .with_reporter(quiet())
        .add_file(first.join("dup.bin"))
        .add_file(second.join("dup.bin"))
        .create(&dest)
        .unwrap();

    assert_eq!(reader.entry_count().unwrap(), 2);
    assert_eq!(reader.entry("dup.bin").unwrap().size, 5);
    assert_eq!(reader.read_entry("dup.bin").unwrap(), b"first");

    let out = dir.path().join("out");
    let report = reader.extract::<&str, _>(&[], &out).unwrap();
    assert_eq!(report.extracted.len(), 1);
    assert_eq!(report.duplicates, vec!["dup.bin".to_string()]);
    assert_eq!(fs::read(out.join("dup.bin")).unwrap(), b"first");
}

// --- Error paths ---

#[test]
fn pfs0_open_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Pfs0Reader::open_path_with_reporter(dir.path().join("nope.nsp"), quiet())
        .expect_err("Test operation should fail");
    assert!(matches!(err, Pfs0Error::NotFound(_)));
}

#[test]
fn pfs0_open_wrong_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.nsp");
    fs::write(&path, b"HFS0\0\0\0\0\0\0\0\0\0\0\0\0").unwrap();

    let err = Pfs0Reader::open_path_with_reporter(&path, quiet())
        .expect_err("Test operation should fail");
    assert!(matches!(err, Pfs0Error::InvalidMagic(m) if &m == b"HFS0"));
}

#[test]
fn pfs0_create_rolls_back_on_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_sources(dir.path(), &[("a.bin", pattern(100, 0))]);
    let dest = dir.path().join("broken.nsp");

    let err = Pfs0Builder::new()
        .with_reporter(quiet())
        .add_files(&sources)
        .add_file(dir.path().join("src").join("gone.bin"))
        .create(&dest)
        .expect_err("Test operation should fail");

    assert!(matches!(err, Pfs0Error::SourceFileMissing(_)));
    assert!(!dest.exists());
}

#[test]
fn pfs0_in_memory_build_decodes() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_sources(
        dir.path(),
        &[("x", pattern(3, 1)), ("yy", pattern(17, 2))],
    );

    let mut bytes = Vec::new();
    Pfs0Builder::new()
        .with_reporter(quiet())
        .add_files(&sources)
        .write_to(&mut bytes)
        .unwrap();

    let header = Pfs0Header::decode(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(header.body_base() % HEADER_ALIGNMENT, 0);
    assert_eq!(bytes.len() as u64, header.body_base() + 20);

    let mut reader = Pfs0Reader::open_with_reporter(Cursor::new(bytes), quiet()).unwrap();
    assert_eq!(reader.read_entry("yy").unwrap(), pattern(17, 2));
}
