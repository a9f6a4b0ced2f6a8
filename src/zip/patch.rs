//! Post-hoc ZIP64 sentinel repair.
//!
//! Some writers emit the ZIP64 EOCD and locator but leave real values in
//! the classic EOCD's entry counts, central directory size and offset.
//! Readers then trust the 32-bit values and never look at the ZIP64
//! record. [`patch_zip64_sentinels`] rewrites those 12 bytes in place.
//!
//! [`ArchiveWriter`](super::ArchiveWriter) never needs this; it writes the
//! sentinels itself. The patch only fits archives without a comment, because
//! the classic EOCD is found at a fixed distance from the end of the file.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::structures::{EndOfCentralDirectory, Zip64EOCDLocator};
use crate::error::{Error, Result};

/// Distance from the end of the file to the entry-count field of a
/// comment-less EOCD.
const SENTINEL_SPAN_FROM_END: i64 = 14;
const SENTINEL_SPAN_LEN: usize = 12;

/// Overwrite the classic EOCD's disk entry count, total entry count,
/// central directory size and offset with their ZIP64 sentinels.
///
/// The stream must hold a complete, flushed archive.
///
/// # Errors
///
/// [`Error::FormatPrecondition`] when the archive has a comment, is too short,
/// has no EOCD at the expected place or has no ZIP64 locator in front of it.
pub fn patch_zip64_sentinels<F: Read + Write + Seek>(file: &mut F) -> Result<()> {
    let len = file.seek(SeekFrom::End(0))?;
    let min_len = (EndOfCentralDirectory::SIZE + Zip64EOCDLocator::SIZE) as u64;
    if len < min_len {
        return Err(Error::FormatPrecondition(format!(
            "{len} bytes is too short for ZIP64 end records"
        )));
    }

    let mut tail = [0u8; EndOfCentralDirectory::SIZE + Zip64EOCDLocator::SIZE];
    file.seek(SeekFrom::Start(len - min_len))?;
    file.read_exact(&mut tail)?;

    let (locator, eocd) = tail.split_at(Zip64EOCDLocator::SIZE);
    if &eocd[20..22] != b"\x00\x00" {
        return Err(Error::FormatPrecondition(
            "archive has a comment, the EOCD is not at a fixed offset".into(),
        ));
    }
    if &eocd[0..4] != EndOfCentralDirectory::SIGNATURE {
        return Err(Error::FormatPrecondition(
            "no End of Central Directory record at the end of the file".into(),
        ));
    }
    if &locator[0..4] != Zip64EOCDLocator::SIGNATURE {
        return Err(Error::FormatPrecondition(
            "no ZIP64 locator in front of the End of Central Directory".into(),
        ));
    }

    file.seek(SeekFrom::End(-SENTINEL_SPAN_FROM_END))?;
    file.write_all(&[0xFF; SENTINEL_SPAN_LEN])?;
    file.flush()?;
    Ok(())
}

/// Re-open a finished archive on disk and patch it.
///
/// The writer that produced the file must have flushed and closed it first.
pub fn patch_zip64_sentinels_at(path: &Path) -> Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    patch_zip64_sentinels(&mut file)?;
    file.sync_all()?;
    Ok(())
}
