//! # zipbuild
//!
//! Build ZIP archives from files and directories, with full control over
//! the ZIP64 extension.
//!
//! The core is a single-pass [`ArchiveWriter`]: each entry is compressed,
//! then its local header and data are written; [`ArchiveWriter::finish`]
//! writes the central directory and end records. ZIP64 records are used
//! only where a value overflows its classic field, or everywhere when
//! [`Zip64Policy::Force`] is selected. In the latter case the classic End of
//! Central Directory record carries the "use ZIP64" sentinels in all of its
//! count, size and offset fields.
//!
//! ## Features
//!
//! - Create or append to archives
//! - Forced or automatic ZIP64, or ZIP64 disabled
//! - Optional preamble written in front of the archive payload
//! - Deterministic output for identical inputs
//! - STORED and DEFLATE compression
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDateTime;
//! use zipbuild::{ArchiveWriter, Entry, WriterOptions, Zip64Policy};
//!
//! fn main() -> zipbuild::Result<()> {
//!     let file = std::fs::File::create("out.zip")?;
//!     let options = WriterOptions::new().zip64(Zip64Policy::Force);
//!     let mut writer = ArchiveWriter::create(file, options)?;
//!
//!     writer.write_entry(&Entry::new("a.txt", "hello", NaiveDateTime::default()))?;
//!     let (_file, summary) = writer.finish()?;
//!     assert!(summary.zip64);
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod cli;
pub mod entry;
pub mod error;
pub mod io;
pub mod walk;
pub mod zip;

pub use build::{BuildOptions, build_archive};
pub use cli::Cli;
pub use entry::Entry;
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt, SeekReader};
pub use walk::{Traverse, traverse};
pub use zip::{
    ArchiveIndex, ArchiveSummary, ArchiveWriter, CompressionCodec, CompressionMethod, OpenMode,
    WriterOptions, Zip64Policy, ZipParser,
};
