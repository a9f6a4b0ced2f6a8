//! Central directory records and the builder that accumulates them.
//!
//! One [`CentralDirectoryRecord`] is kept per entry while entries are
//! written. At finalize time [`CentralDirectory::write_to`] serializes them
//! back to back, deciding per field whether the 32-bit header value can hold
//! the real number or must defer to the ZIP64 extra field.

use std::borrow::Cow;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::structures::{
    CDFH_MIN_SIZE, CDFH_SIGNATURE, CompressionMethod, VERSION_ZIP64,
    ZIP64_SENTINEL_32, Zip64ExtraField,
};
use crate::error::{Error, Result};

/// Metadata for one entry as listed in the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    /// Raw name bytes, `/` separated.
    pub name: Vec<u8>,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Offset of the local header, relative to the start of the archive
    /// payload (after any preamble).
    pub local_header_offset: u64,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    /// Extra fields other than ZIP64, kept verbatim.
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl CentralDirectoryRecord {
    /// Name decoded as UTF-8, with invalid sequences replaced.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// The ZIP64 extra field this record needs.
    ///
    /// With `force` every value is carried as 64 bits; otherwise only the
    /// values that do not fit below the 32-bit sentinel.
    pub fn zip64_extra(&self, force: bool) -> Zip64ExtraField {
        let promote = |value: u64| force || value >= ZIP64_SENTINEL_32 as u64;
        Zip64ExtraField {
            uncompressed_size: promote(self.uncompressed_size).then_some(self.uncompressed_size),
            compressed_size: promote(self.compressed_size).then_some(self.compressed_size),
            local_header_offset: promote(self.local_header_offset)
                .then_some(self.local_header_offset),
        }
    }

    /// Size of the serialized record.
    pub fn encoded_len(&self, force_zip64: bool) -> u64 {
        (CDFH_MIN_SIZE
            + self.name.len()
            + self.zip64_extra(force_zip64).encoded_len()
            + self.extra.len()
            + self.comment.len()) as u64
    }

    /// Serialize this record, returning the number of bytes appended.
    pub fn write_to(&self, out: &mut Vec<u8>, force_zip64: bool) -> Result<usize> {
        let zip64 = self.zip64_extra(force_zip64);

        let name_len = u16::try_from(self.name.len()).map_err(|_| Error::NameTooLong {
            name: self.name().into_owned(),
            len: self.name.len(),
        })?;
        let extra_len = u16::try_from(zip64.encoded_len() + self.extra.len()).map_err(|_| {
            Error::FormatPrecondition(format!("extra field of {:?} is too large", self.name()))
        })?;
        let comment_len = u16::try_from(self.comment.len()).map_err(|_| {
            Error::FormatPrecondition(format!("comment of {:?} is too large", self.name()))
        })?;

        let (version_made_by, version_needed) = if zip64.is_empty() {
            (self.version_made_by, self.version_needed)
        } else {
            let needed = self.version_needed.max(VERSION_ZIP64);
            let made_by = (self.version_made_by & 0xFF00) | (self.version_made_by & 0xFF).max(needed);
            (made_by, needed)
        };

        let narrow = |value: Option<u64>, real: u64| match value {
            Some(_) => ZIP64_SENTINEL_32,
            None => real as u32,
        };

        let start = out.len();
        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(version_made_by)?;
        out.write_u16::<LittleEndian>(version_needed)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.last_mod_time)?;
        out.write_u16::<LittleEndian>(self.last_mod_date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(narrow(zip64.compressed_size, self.compressed_size))?;
        out.write_u32::<LittleEndian>(narrow(zip64.uncompressed_size, self.uncompressed_size))?;
        out.write_u16::<LittleEndian>(name_len)?;
        out.write_u16::<LittleEndian>(extra_len)?;
        out.write_u16::<LittleEndian>(comment_len)?;
        // disk number start
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(self.internal_attributes)?;
        out.write_u32::<LittleEndian>(self.external_attributes)?;
        out.write_u32::<LittleEndian>(narrow(
            zip64.local_header_offset,
            self.local_header_offset,
        ))?;
        debug_assert_eq!(out.len() - start, CDFH_MIN_SIZE);

        out.write_all(&self.name)?;
        zip64.write_to(out)?;
        out.write_all(&self.extra)?;
        out.write_all(&self.comment)?;

        Ok(out.len() - start)
    }
}

/// Accumulates one record per written entry.
#[derive(Debug, Default, Clone)]
pub struct CentralDirectory {
    records: Vec<CentralDirectoryRecord>,
}

impl CentralDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CentralDirectoryRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size the directory will have once written.
    pub fn encoded_len(&self, force_zip64: bool) -> u64 {
        self.records
            .iter()
            .map(|r| r.encoded_len(force_zip64))
            .sum()
    }

    /// Write every record in insertion order and return the total size.
    pub fn write_to<W: Write>(&self, sink: &mut W, force_zip64: bool) -> Result<u64> {
        let mut buf = Vec::with_capacity(CDFH_MIN_SIZE + 256);
        let mut total = 0u64;
        for record in &self.records {
            buf.clear();
            total += record.write_to(&mut buf, force_zip64)? as u64;
            sink.write_all(&buf)?;
        }
        Ok(total)
    }
}

impl From<Vec<CentralDirectoryRecord>> for CentralDirectory {
    fn from(records: Vec<CentralDirectoryRecord>) -> Self {
        Self { records }
    }
}
