use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::io::{Cursor, Write};

use crate::error::{Error, Result};

/// 16-bit field value meaning "read the ZIP64 record instead".
pub const ZIP64_SENTINEL_16: u16 = 0xFFFF;
/// 32-bit field value meaning "read the ZIP64 record instead".
pub const ZIP64_SENTINEL_32: u32 = 0xFFFF_FFFF;

/// Version needed to extract: plain deflate/stored entries.
pub const VERSION_DEFAULT: u16 = 20;
/// Version needed to extract: entries or archives using ZIP64 records.
pub const VERSION_ZIP64: u16 = 45;

/// General purpose flag bit 11: name is UTF-8.
pub const FLAG_UTF8: u16 = 0x0800;

/// Host system byte of "version made by".
#[cfg(unix)]
pub const HOST_SYSTEM: u16 = 3;
#[cfg(not(unix))]
pub const HOST_SYSTEM: u16 = 0;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Record holding the real values; every field must fit.
    pub fn classic(entries: u16, cd_size: u32, cd_offset: u32, comment_len: u16) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len,
        }
    }

    /// Record that defers entry counts, size and offset to the ZIP64 EOCD.
    pub fn zip64_sentinel(comment_len: u16) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: ZIP64_SENTINEL_16,
            total_entries: ZIP64_SENTINEL_16,
            cd_size: ZIP64_SENTINEL_32,
            cd_offset: ZIP64_SENTINEL_32,
            comment_len,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidArchive("truncated End of Central Directory"));
        }

        // Verify signature
        if &data[0..4] != Self::SIGNATURE {
            return Err(Error::InvalidArchive("bad End of Central Directory signature"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Write the fixed 22-byte record. The comment itself follows it.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == ZIP64_SENTINEL_16
            || self.total_entries == ZIP64_SENTINEL_16
            || self.cd_size == ZIP64_SENTINEL_32
            || self.cd_offset == ZIP64_SENTINEL_32
    }

    /// True when all four deferred fields carry the ZIP64 sentinel.
    pub fn has_all_sentinels(&self) -> bool {
        self.disk_entries == ZIP64_SENTINEL_16
            && self.total_entries == ZIP64_SENTINEL_16
            && self.cd_size == ZIP64_SENTINEL_32
            && self.cd_offset == ZIP64_SENTINEL_32
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn new(eocd64_offset: u64) -> Self {
        Self {
            disk_with_eocd64: 0,
            eocd64_offset,
            total_disks: 1,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidArchive("truncated ZIP64 locator"));
        }

        if &data[0..4] != Self::SIGNATURE {
            return Err(Error::InvalidArchive("bad ZIP64 locator signature"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u32::<LittleEndian>(self.disk_with_eocd64)?;
        out.write_u64::<LittleEndian>(self.eocd64_offset)?;
        out.write_u32::<LittleEndian>(self.total_disks)
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn new(entries: u64, cd_size: u64, cd_offset: u64) -> Self {
        Self {
            // size of the remaining record, excluding signature and this field
            eocd64_size: (Self::MIN_SIZE - 12) as u64,
            version_made_by: (HOST_SYSTEM << 8) | VERSION_ZIP64,
            version_needed: VERSION_ZIP64,
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(Error::InvalidArchive("truncated ZIP64 End of Central Directory"));
        }

        if &data[0..4] != Self::SIGNATURE {
            return Err(Error::InvalidArchive(
                "bad ZIP64 End of Central Directory signature",
            ));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u64::<LittleEndian>(self.eocd64_size)?;
        out.write_u16::<LittleEndian>(self.version_made_by)?;
        out.write_u16::<LittleEndian>(self.version_needed)?;
        out.write_u32::<LittleEndian>(self.disk_number)?;
        out.write_u32::<LittleEndian>(self.disk_with_cd)?;
        out.write_u64::<LittleEndian>(self.disk_entries)?;
        out.write_u64::<LittleEndian>(self.total_entries)?;
        out.write_u64::<LittleEndian>(self.cd_size)?;
        out.write_u64::<LittleEndian>(self.cd_offset)
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Fixed part of a Local File Header. Name and extra field follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < LFH_SIZE {
            return Err(Error::InvalidArchive("truncated Local File Header"));
        }

        if &data[0..4] != LFH_SIGNATURE {
            return Err(Error::InvalidArchive("bad Local File Header signature"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.version_needed)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.last_mod_time)?;
        out.write_u16::<LittleEndian>(self.last_mod_date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(self.file_name_length)?;
        out.write_u16::<LittleEndian>(self.extra_field_length)
    }
}

/// ZIP64 extended information extra field (header ID 0x0001).
///
/// Only the values whose 32-bit header field holds the sentinel are
/// present, always in this order: uncompressed size, compressed size,
/// local header offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub local_header_offset: Option<u64>,
}

impl Zip64ExtraField {
    pub const HEADER_ID: u16 = 0x0001;

    pub fn is_empty(&self) -> bool {
        self.uncompressed_size.is_none()
            && self.compressed_size.is_none()
            && self.local_header_offset.is_none()
    }

    fn data_len(&self) -> u16 {
        [
            self.uncompressed_size,
            self.compressed_size,
            self.local_header_offset,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count() as u16
            * 8
    }

    /// Total encoded length including the 4-byte field header.
    pub fn encoded_len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            4 + self.data_len() as usize
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        out.write_u16::<LittleEndian>(Self::HEADER_ID)?;
        out.write_u16::<LittleEndian>(self.data_len())?;
        for value in [
            self.uncompressed_size,
            self.compressed_size,
            self.local_header_offset,
        ]
        .into_iter()
        .flatten()
        {
            out.write_u64::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

/// MS-DOS date and time as stored in ZIP headers (2-second resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// Convert a local timestamp, clamping to the 1980..=2107 range the
    /// format can represent.
    pub fn from_naive(ts: &NaiveDateTime) -> Self {
        let (year, month, day, hour, minute, second) = if ts.year() < 1980 {
            (1980, 1, 1, 0, 0, 0)
        } else if ts.year() > 2107 {
            (2107, 12, 31, 23, 59, 58)
        } else {
            (
                ts.year() as u16,
                ts.month() as u16,
                ts.day() as u16,
                ts.hour() as u16,
                ts.minute() as u16,
                ts.second() as u16,
            )
        };

        Self {
            time: (hour << 11) | (minute << 5) | (second / 2),
            date: ((year - 1980) << 9) | (month << 5) | day,
        }
    }

    /// Decode back into a timestamp; `None` for out-of-range fields.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let day = (self.date & 0x1F) as u32;
        let month = ((self.date >> 5) & 0x0F) as u32;
        let year = ((self.date >> 9) & 0x7F) as i32 + 1980;
        let second = ((self.time & 0x1F) * 2) as u32;
        let minute = ((self.time >> 5) & 0x3F) as u32;
        let hour = ((self.time >> 11) & 0x1F) as u32;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn eocd_sentinel_layout() {
        let mut buf = Vec::new();
        EndOfCentralDirectory::zip64_sentinel(0)
            .write_to(&mut buf)
            .unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&buf[0..4], b"PK\x05\x06");
        assert_eq!(&buf[4..8], &[0, 0, 0, 0]);
        assert_eq!(&buf[8..20], &[0xFF; 12]);
        assert_eq!(&buf[20..22], &[0, 0]);

        let parsed = EndOfCentralDirectory::from_bytes(&buf).unwrap();
        assert!(parsed.has_all_sentinels());
    }

    #[test]
    fn classic_eocd_is_not_zip64() {
        let eocd = EndOfCentralDirectory::classic(3, 150, 1000, 0);
        assert!(!eocd.is_zip64());
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(EndOfCentralDirectory::from_bytes(&buf).unwrap(), eocd);
    }

    #[test]
    fn zip64_records_have_fixed_sizes() {
        let mut buf = Vec::new();
        Zip64EOCD::new(1, 59, 40).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Zip64EOCD::MIN_SIZE);
        let parsed = Zip64EOCD::from_bytes(&buf).unwrap();
        assert_eq!(parsed.eocd64_size, 44);
        assert_eq!(parsed.version_needed, VERSION_ZIP64);
        assert_eq!(parsed.cd_offset, 40);

        let mut buf = Vec::new();
        Zip64EOCDLocator::new(99).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Zip64EOCDLocator::SIZE);
        let parsed = Zip64EOCDLocator::from_bytes(&buf).unwrap();
        assert_eq!(parsed.eocd64_offset, 99);
        assert_eq!(parsed.total_disks, 1);
    }

    #[test]
    fn zip64_extra_only_carries_present_values() {
        let extra = Zip64ExtraField {
            uncompressed_size: None,
            compressed_size: Some(0x1_0000_0000),
            local_header_offset: Some(7),
        };
        let mut buf = Vec::new();
        extra.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), extra.encoded_len());
        assert_eq!(&buf[0..4], &[0x01, 0x00, 16, 0]);
        assert_eq!(&buf[4..12], &0x1_0000_0000u64.to_le_bytes());
        assert_eq!(&buf[12..20], &7u64.to_le_bytes());

        let mut buf = Vec::new();
        Zip64ExtraField::default().write_to(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn dos_time_roundtrips_at_two_second_resolution() {
        let dos = DosDateTime::from_naive(&ts(2024, 2, 29, 13, 45, 31));
        assert_eq!(dos.to_naive(), Some(ts(2024, 2, 29, 13, 45, 30)));
    }

    #[test]
    fn dos_time_clamps_out_of_range_years() {
        let early = DosDateTime::from_naive(&ts(1970, 1, 1, 0, 0, 0));
        assert_eq!(early.to_naive(), Some(ts(1980, 1, 1, 0, 0, 0)));
        let late = DosDateTime::from_naive(&ts(2200, 6, 1, 0, 0, 0));
        assert_eq!(late.to_naive(), Some(ts(2107, 12, 31, 23, 59, 58)));
    }

    #[test]
    fn local_header_roundtrip() {
        let header = LocalFileHeader {
            version_needed: VERSION_ZIP64,
            flags: 0,
            compression_method: CompressionMethod::Deflate,
            last_mod_time: 0x6000,
            last_mod_date: 0x5821,
            crc32: 0x3610_a686,
            compressed_size: ZIP64_SENTINEL_32,
            uncompressed_size: ZIP64_SENTINEL_32,
            file_name_length: 5,
            extra_field_length: 20,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), LFH_SIZE);
        assert_eq!(LocalFileHeader::from_bytes(&buf).unwrap(), header);
    }
}
