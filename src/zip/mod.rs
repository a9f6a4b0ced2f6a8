//! ZIP archive writing, with ZIP64 support.
//!
//! ## Architecture
//!
//! - [`structures`]: wire records (local header, central directory header,
//!   EOCD, ZIP64 EOCD and locator, ZIP64 extra field, DOS time)
//! - [`codec`]: the pluggable compressor
//! - [`central_directory`]: one record per written entry, and their encoding
//! - [`writer`]: the single-pass [`ArchiveWriter`]
//! - [`append`]: finding where an appending writer resumes
//! - [`parser`]: reading an archive back from its end
//! - [`patch`]: post-hoc repair of the classic EOCD's ZIP64 sentinels
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. For ZIP64 archives, a ZIP64 EOCD record and its locator
//! 4. End of Central Directory (EOCD) record at the end
//!
//! Anything in front of the first local header (a preamble, for example a
//! launcher script) is not part of the archive: all offsets stored in the
//! archive are relative to the first local header.
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Only STORED and DEFLATE are written

pub mod append;
pub mod central_directory;
pub mod codec;
pub mod parser;
pub mod patch;
pub mod structures;
pub mod writer;

pub use append::AppendPoint;
pub use central_directory::{CentralDirectory, CentralDirectoryRecord};
pub use codec::{CompressedData, CompressionCodec, DeflateCodec, StoredCodec, codec_for};
pub use parser::{ArchiveIndex, LocalEntry, ZipParser};
pub use patch::{patch_zip64_sentinels, patch_zip64_sentinels_at};
pub use structures::*;
pub use writer::{ArchiveSummary, ArchiveWriter, OpenMode, WriterOptions, Zip64Policy};
