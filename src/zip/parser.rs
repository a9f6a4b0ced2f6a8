//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//! The writer uses it to index an existing archive in append mode;
//! tests use it to check what the writer produced.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If a ZIP64 locator precedes it, read the ZIP64 EOCD
//! 3. Work out where the archive payload starts (bytes before it are a
//!    preamble) from where the central directory really ends
//! 4. Read the Central Directory to get metadata for all files

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::central_directory::CentralDirectoryRecord;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Everything read from the end of an archive plus its central directory.
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    /// Bytes in front of the archive payload (a preamble).
    pub base_offset: u64,
    pub eocd: EndOfCentralDirectory,
    /// Absolute offset of the classic EOCD.
    pub eocd_offset: u64,
    pub comment: Vec<u8>,
    pub zip64_locator: Option<Zip64EOCDLocator>,
    pub zip64_eocd: Option<Zip64EOCD>,
    /// Absolute offset of the ZIP64 EOCD, when present.
    pub zip64_eocd_offset: Option<u64>,
    /// Payload-relative central directory offset.
    pub cd_offset: u64,
    pub cd_size: u64,
    pub records: Vec<CentralDirectoryRecord>,
}

impl ArchiveIndex {
    pub fn is_zip64(&self) -> bool {
        self.zip64_eocd.is_some()
    }
}

/// Local header of an entry as found in the file.
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub header: LocalFileHeader,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
    /// Absolute offset of the entry data.
    pub data_offset: u64,
}

/// Low-level ZIP file parser.
///
/// Borrows any [`ReadAt`] source: a file, a byte buffer, or a stream
/// wrapped in [`SeekReader`](crate::io::SeekReader).
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(&bytes);
/// let index = parser.index()?;
/// for record in &index.records {
///     let local = parser.local_entry(&index, record)?;
///     // Read file data from local.data_offset...
/// }
/// ```
pub struct ZipParser<'a, R: ReadAt + ?Sized> {
    /// The underlying data source
    reader: &'a R,
    /// Total size of the source in bytes
    size: u64,
}

impl<'a, R: ReadAt + ?Sized> ZipParser<'a, R> {
    /// Create a new parser for the given reader.
    pub fn new(reader: &'a R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Look for the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// `None` when the source holds no EOCD at all, otherwise the record
    /// and its absolute offset.
    pub fn locate_eocd(&self) -> Result<Option<(EndOfCentralDirectory, u64)>> {
        // Optimization: First try the simple case where there's no comment.
        // This avoids reading extra data in the common case.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf)?;

            // Check for signature and zero-length comment
            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok(Some((eocd, offset)));
            }
        } else {
            return Ok(None);
        }

        // EOCD not at expected location - search for it.
        // The EOCD could be earlier if there's a ZIP comment.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        // Search backwards for EOCD signature (PK\x05\x06)
        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // Found a potential EOCD - verify the comment length is correct.
                // The comment length field should match the remaining bytes.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok(Some((eocd, search_start + i as u64)));
                }
            }
        }

        Ok(None)
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if no EOCD can be found,
    /// indicating the source is not a ZIP archive.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        self.locate_eocd()?
            .ok_or(Error::InvalidArchive("no End of Central Directory record"))
    }

    /// Read the ZIP64 locator and End of Central Directory record.
    ///
    /// The locator sits immediately before the classic EOCD. Its offset
    /// field is relative to the payload start, which is unknown while a
    /// preamble may be present, so the ZIP64 EOCD is looked for directly in
    /// front of the locator first.
    ///
    /// # Returns
    ///
    /// `None` when there is no locator, otherwise the locator, the ZIP64
    /// EOCD and its absolute offset.
    pub fn read_zip64_eocd(
        &self,
        eocd_offset: u64,
    ) -> Result<Option<(Zip64EOCDLocator, Zip64EOCD, u64)>> {
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64) else {
            return Ok(None);
        };
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;
        if &locator_buf[0..4] != Zip64EOCDLocator::SIGNATURE {
            return Ok(None);
        }
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let adjacent = locator_offset.checked_sub(Zip64EOCD::MIN_SIZE as u64);
        for candidate in adjacent.into_iter().chain([locator.eocd64_offset]) {
            match candidate.checked_add(Zip64EOCD::MIN_SIZE as u64) {
                Some(end) if end <= self.size => {}
                _ => continue,
            }
            let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
            self.reader.read_exact_at(candidate, &mut eocd64_buf)?;
            if &eocd64_buf[0..4] == Zip64EOCD::SIGNATURE {
                let eocd64 = Zip64EOCD::from_bytes(&eocd64_buf)?;
                return Ok(Some((locator, eocd64, candidate)));
            }
        }

        Err(Error::InvalidArchive("ZIP64 locator without a ZIP64 End of Central Directory"))
    }

    /// Read the end records and the whole Central Directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is invalid or cannot be read.
    pub fn index(&self) -> Result<ArchiveIndex> {
        // Find and parse the EOCD to get Central Directory location
        let (eocd, eocd_offset) = self.find_eocd()?;

        let mut comment = vec![0u8; eocd.comment_len as usize];
        self.reader
            .read_exact_at(eocd_offset + EndOfCentralDirectory::SIZE as u64, &mut comment)?;

        let zip64 = self.read_zip64_eocd(eocd_offset)?;

        // Get Central Directory info, and where it really ends
        let (cd_offset, cd_size, total_entries, cd_end) = match &zip64 {
            Some((_, eocd64, eocd64_offset)) => (
                eocd64.cd_offset,
                eocd64.cd_size,
                eocd64.total_entries,
                *eocd64_offset,
            ),
            None if eocd.is_zip64() => {
                return Err(Error::InvalidArchive(
                    "ZIP64 sentinel values without a ZIP64 locator",
                ));
            }
            None => (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
                eocd_offset,
            ),
        };

        let base_offset = cd_end
            .checked_sub(cd_size)
            .and_then(|start| start.checked_sub(cd_offset))
            .ok_or(Error::InvalidArchive("central directory lies outside the file"))?;

        // Read the entire Central Directory in one request
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader
            .read_exact_at(base_offset + cd_offset, &mut cd_data)?;

        // Parse each Central Directory File Header entry
        let mut records = Vec::with_capacity(total_entries.min(u16::MAX as u64) as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            records.push(self.parse_cdfh(&mut cursor)?);
        }

        let (zip64_locator, zip64_eocd, zip64_eocd_offset) = match zip64 {
            Some((locator, eocd64, offset)) => (Some(locator), Some(eocd64), Some(offset)),
            None => (None, None, None),
        };

        Ok(ArchiveIndex {
            base_offset,
            eocd,
            eocd_offset,
            comment,
            zip64_locator,
            zip64_eocd,
            zip64_eocd_offset,
            cd_offset,
            cd_size,
            records,
        })
    }

    /// Parse a Central Directory File Header from a cursor.
    ///
    /// ZIP64 values replace their 32-bit fields; every other extra field
    /// is kept verbatim in [`CentralDirectoryRecord::extra`].
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<CentralDirectoryRecord> {
        // Read and verify the signature (PK\x01\x02)
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(Error::InvalidArchive("bad Central Directory File Header signature"));
        }

        // Read fixed-size header fields
        let version_made_by = cursor.read_u16::<LittleEndian>()?;
        let version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let internal_attributes = cursor.read_u16::<LittleEndian>()?;
        let external_attributes = cursor.read_u32::<LittleEndian>()?;
        let mut local_header_offset = cursor.read_u32::<LittleEndian>()? as u64;

        if disk_number_start != 0 && disk_number_start != ZIP64_SENTINEL_16 {
            return Err(Error::UnsupportedMode(
                "entries spread over several disks".into(),
            ));
        }

        let mut name = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut name)?;

        let mut extra_field = vec![0u8; extra_field_length as usize];
        cursor.read_exact(&mut extra_field)?;

        let mut comment = vec![0u8; file_comment_length as usize];
        cursor.read_exact(&mut comment)?;

        // Parse extra field for ZIP64 extended information
        // ZIP64 uses extra field ID 0x0001
        let mut extra = Vec::new();
        let mut fields = Cursor::new(extra_field.as_slice());
        while fields.position() + 4 <= extra_field.len() as u64 {
            let start = fields.position() as usize;
            let header_id = fields.read_u16::<LittleEndian>()?;
            let field_size = fields.read_u16::<LittleEndian>()? as usize;
            let end = start + 4 + field_size;
            if end > extra_field.len() {
                return Err(Error::InvalidArchive("extra field overruns its header"));
            }

            if header_id == Zip64ExtraField::HEADER_ID {
                // Fields are present only if corresponding header field is 0xFFFFFFFF
                let mut data = Cursor::new(&extra_field[start + 4..end]);
                if uncompressed_size == ZIP64_SENTINEL_32 as u64 {
                    uncompressed_size = data.read_u64::<LittleEndian>()?;
                }
                if compressed_size == ZIP64_SENTINEL_32 as u64 {
                    compressed_size = data.read_u64::<LittleEndian>()?;
                }
                if local_header_offset == ZIP64_SENTINEL_32 as u64 {
                    local_header_offset = data.read_u64::<LittleEndian>()?;
                }
            } else {
                extra.extend_from_slice(&extra_field[start..end]);
            }
            fields.set_position(end as u64);
        }

        Ok(CentralDirectoryRecord {
            name,
            version_made_by,
            version_needed,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
            internal_attributes,
            external_attributes,
            extra,
            comment,
        })
    }

    /// Read an entry's Local File Header.
    ///
    /// The LFH has variable-length fields (filename, extra field) that may
    /// differ from the Central Directory entry, so the data offset can only
    /// be known after reading it.
    pub fn local_entry(
        &self,
        index: &ArchiveIndex,
        record: &CentralDirectoryRecord,
    ) -> Result<LocalEntry> {
        let lfh_offset = index.base_offset + record.local_header_offset;
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(lfh_offset, &mut lfh_buf)?;
        let header = LocalFileHeader::from_bytes(&lfh_buf)?;

        let mut name = vec![0u8; header.file_name_length as usize];
        self.reader
            .read_exact_at(lfh_offset + LFH_SIZE as u64, &mut name)?;
        let mut extra = vec![0u8; header.extra_field_length as usize];
        self.reader
            .read_exact_at(lfh_offset + LFH_SIZE as u64 + name.len() as u64, &mut extra)?;

        // Data starts after: LFH (30 bytes) + filename + extra field
        let data_offset = lfh_offset + LFH_SIZE as u64 + name.len() as u64 + extra.len() as u64;

        Ok(LocalEntry {
            header,
            name,
            extra,
            data_offset,
        })
    }

    /// Absolute offset of an entry's data.
    pub fn data_offset(&self, index: &ArchiveIndex, record: &CentralDirectoryRecord) -> Result<u64> {
        Ok(self.local_entry(index, record)?.data_offset)
    }

    /// Read the stored (possibly compressed) bytes of an entry.
    pub fn raw_data(&self, index: &ArchiveIndex, record: &CentralDirectoryRecord) -> Result<Vec<u8>> {
        let data_offset = self.data_offset(index, record)?;
        let mut buf = vec![0u8; record.compressed_size as usize];
        self.reader.read_exact_at(data_offset, &mut buf)?;
        Ok(buf)
    }
}
