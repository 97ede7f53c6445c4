//! Parser, reader and builder for the PFS0 flat archive container
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::doc_markdown)] // Format terms don't need backticks
//! This crate reads, lists, extracts and creates PFS0 archives (the container
//! used by NSP packages). The header codec and file table are symmetric:
//! encoding a set of files and decoding the result yields the same names,
//! sizes and offsets.
//!
//! # Design Principles
//!
//! - **Bounded memory**: payloads are streamed through a fixed-size buffer,
//!   independent of entry or archive size
//! - **Typed errors**: format errors, store failures and per-entry
//!   destination failures are distinct [`pfs0::Pfs0Error`] kinds
//! - **No global state**: every reader and builder carries its own reporter
//! - **Whole-file writes**: archives are created in one pass and never
//!   modified in place

#![warn(missing_docs)]

pub mod pfs0;
