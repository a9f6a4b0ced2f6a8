//! Single-pass ZIP archive writer.
//!
//! Entries are compressed completely before their local header is written,
//! so sizes and CRC are always known up front and no data descriptors are
//! needed. The writer keeps a cursor relative to the start of the archive
//! payload: a preamble, or whatever else precedes the archive in the sink,
//! never shows up in recorded offsets.
//!
//! ## ZIP64
//!
//! [`Zip64Policy`] decides where 64-bit values are used:
//!
//! - `Force`: every local header carries a ZIP64 extra field with both
//!   sizes, every central directory record carries sizes and offset, and the
//!   archive always ends with a ZIP64 EOCD, its locator and a classic EOCD
//!   whose counts, size and offset hold the "use ZIP64" sentinels.
//! - `Auto`: 64-bit values appear only where a 32-bit field would
//!   overflow, and the ZIP64 end records only when the entry count, the
//!   central directory size or its offset do not fit.
//! - `Never`: anything that would need ZIP64 fails with
//!   [`Error::FormatPrecondition`].
//!
//! The decision for the end records is made in [`ArchiveWriter::finish`]
//! before anything is written, and the sentinel values are written
//! directly. No post-write patching is involved.

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::{debug, warn};

use super::append::AppendPoint;
use super::central_directory::{CentralDirectory, CentralDirectoryRecord};
use super::codec::{CompressionCodec, codec_for};
use super::structures::{
    CompressionMethod, DosDateTime, EndOfCentralDirectory, FLAG_UTF8, HOST_SYSTEM, LFH_SIZE,
    LocalFileHeader, VERSION_DEFAULT, VERSION_ZIP64, ZIP64_SENTINEL_16, ZIP64_SENTINEL_32,
    Zip64EOCD, Zip64EOCDLocator, Zip64ExtraField,
};
use crate::entry::{Entry, validate_name};
use crate::error::{Error, Result};
use crate::io::Truncate;

/// When to use ZIP64 records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zip64Policy {
    /// Only where a value does not fit its classic field.
    #[default]
    Auto,
    /// Everywhere, even for tiny archives.
    Force,
    /// Never; values that do not fit are an error.
    Never,
}

/// How [`ArchiveWriter::open`] treats an existing sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Discard existing content.
    #[default]
    Create,
    /// Keep the entries of an existing archive and add new ones after them.
    Append,
}

/// Per-build writer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    pub zip64: Zip64Policy,
    pub method: CompressionMethod,
    /// Deflate level, 0..=9.
    pub level: u32,
    /// Bytes written verbatim before the archive payload.
    pub preamble: Vec<u8>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            zip64: Zip64Policy::Auto,
            method: CompressionMethod::Deflate,
            level: 6,
            preamble: Vec::new(),
        }
    }
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zip64(mut self, policy: Zip64Policy) -> Self {
        self.zip64 = policy;
        self
    }

    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn preamble(mut self, preamble: impl Into<Vec<u8>>) -> Self {
        self.preamble = preamble.into();
        self
    }
}

/// What [`ArchiveWriter::finish`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Entries listed in the central directory.
    pub entries: u64,
    /// Entries written by this writer (excludes entries kept by append).
    pub entries_added: u64,
    /// Payload-relative central directory offset.
    pub cd_offset: u64,
    pub cd_size: u64,
    /// Whether the ZIP64 EOCD and locator were emitted.
    pub zip64: bool,
    /// Payload length, from the first local header to the end of the EOCD.
    pub archive_len: u64,
}

/// Writes entries sequentially to a sink and finalizes the central
/// directory and end records.
pub struct ArchiveWriter<W: Write> {
    sink: W,
    /// Write position relative to the archive payload start.
    cursor: u64,
    central_directory: CentralDirectory,
    names: HashSet<Vec<u8>>,
    policy: Zip64Policy,
    codec: Box<dyn CompressionCodec>,
    comment: Vec<u8>,
    entries_added: u64,
}

impl<W: Write> ArchiveWriter<W> {
    /// Start a new archive at the sink's current position.
    pub fn create(mut sink: W, options: WriterOptions) -> Result<Self> {
        let codec = codec_for(options.method, options.level)?;
        sink.write_all(&options.preamble)?;

        Ok(Self {
            sink,
            cursor: 0,
            central_directory: CentralDirectory::new(),
            names: HashSet::new(),
            policy: options.zip64,
            codec,
            comment: Vec::new(),
            entries_added: 0,
        })
    }

    /// Continue an archive located by [`AppendPoint::locate`].
    ///
    /// The sink must already be positioned by [`AppendPoint::prepare`].
    pub fn resume(mut sink: W, point: AppendPoint, options: WriterOptions) -> Result<Self> {
        let codec = codec_for(options.method, options.level)?;

        check_resumable(&point, &options)?;
        if !point.existing_archive {
            sink.write_all(&options.preamble)?;
        }

        let names = point.records.iter().map(|r| r.name.clone()).collect();
        Ok(Self {
            sink,
            cursor: point.cursor,
            central_directory: CentralDirectory::from(point.records),
            names,
            policy: options.zip64,
            codec,
            comment: point.comment,
            entries_added: 0,
        })
    }

    /// Replace the compressor chosen from [`WriterOptions::method`].
    pub fn with_codec(mut self, codec: Box<dyn CompressionCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn policy(&self) -> Zip64Policy {
        self.policy
    }

    /// Entries recorded so far, including those kept by append.
    pub fn len(&self) -> usize {
        self.central_directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central_directory.is_empty()
    }

    /// Write a local file header followed by the compressed data.
    pub fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        validate_name(&entry.name)?;
        let name = entry.name.as_bytes();
        if !self.names.insert(name.to_vec()) {
            warn!(name = %entry.name, "duplicate entry name");
        }

        let compressed = self.codec.compress(&entry.data)?;
        let offset = self.cursor;
        let force = self.policy == Zip64Policy::Force;

        let sizes_overflow = compressed.uncompressed_size >= ZIP64_SENTINEL_32 as u64
            || compressed.compressed_size >= ZIP64_SENTINEL_32 as u64;
        let offset_overflow = offset >= ZIP64_SENTINEL_32 as u64;

        if self.policy == Zip64Policy::Never && (sizes_overflow || offset_overflow) {
            return Err(Error::FormatPrecondition(format!(
                "entry {:?} needs ZIP64 but ZIP64 is disabled",
                entry.name
            )));
        }

        // the local header has no offset field, only sizes can force its extra
        let local_zip64 = force || sizes_overflow;
        let version_needed = if local_zip64 || offset_overflow {
            VERSION_ZIP64
        } else {
            VERSION_DEFAULT
        };
        let flags = if entry.name.is_ascii() { 0 } else { FLAG_UTF8 };
        let dos = DosDateTime::from_naive(&entry.modified);

        let extra = if local_zip64 {
            Zip64ExtraField {
                uncompressed_size: Some(compressed.uncompressed_size),
                compressed_size: Some(compressed.compressed_size),
                local_header_offset: None,
            }
        } else {
            Zip64ExtraField::default()
        };

        let header = LocalFileHeader {
            version_needed,
            flags,
            compression_method: self.codec.method(),
            last_mod_time: dos.time,
            last_mod_date: dos.date,
            crc32: compressed.crc32,
            compressed_size: if local_zip64 {
                ZIP64_SENTINEL_32
            } else {
                compressed.compressed_size as u32
            },
            uncompressed_size: if local_zip64 {
                ZIP64_SENTINEL_32
            } else {
                compressed.uncompressed_size as u32
            },
            file_name_length: name.len() as u16,
            extra_field_length: extra.encoded_len() as u16,
        };

        let mut buf = Vec::with_capacity(LFH_SIZE + name.len() + extra.encoded_len());
        header.write_to(&mut buf)?;
        buf.extend_from_slice(name);
        extra.write_to(&mut buf)?;

        self.sink.write_all(&buf)?;
        self.sink.write_all(&compressed.bytes)?;
        self.cursor += buf.len() as u64 + compressed.compressed_size;

        self.central_directory.push(CentralDirectoryRecord {
            name: name.to_vec(),
            version_made_by: (HOST_SYSTEM << 8) | version_needed,
            version_needed,
            flags,
            compression_method: self.codec.method(),
            last_mod_time: dos.time,
            last_mod_date: dos.date,
            crc32: compressed.crc32,
            compressed_size: compressed.compressed_size,
            uncompressed_size: compressed.uncompressed_size,
            local_header_offset: offset,
            internal_attributes: 0,
            external_attributes: entry.unix_mode.map_or(0, |mode| mode << 16),
            extra: Vec::new(),
            comment: Vec::new(),
        });
        self.entries_added += 1;

        Ok(())
    }

    /// Write the central directory and end records, then flush.
    pub fn finish(mut self) -> Result<(W, ArchiveSummary)> {
        let force = self.policy == Zip64Policy::Force;
        let entries = self.central_directory.len() as u64;
        let cd_offset = self.cursor;
        let cd_size = self.central_directory.encoded_len(force);

        let zip64 = force
            || entries >= ZIP64_SENTINEL_16 as u64
            || cd_size >= ZIP64_SENTINEL_32 as u64
            || cd_offset >= ZIP64_SENTINEL_32 as u64;

        if zip64 && self.policy == Zip64Policy::Never {
            return Err(Error::FormatPrecondition(format!(
                "{entries} entries, central directory of {cd_size} bytes at {cd_offset} \
                 need ZIP64 but ZIP64 is disabled"
            )));
        }
        let comment_len = u16::try_from(self.comment.len()).map_err(|_| {
            Error::FormatPrecondition("archive comment longer than 65535 bytes".into())
        })?;

        let written = self.central_directory.write_to(&mut self.sink, force)?;
        debug_assert_eq!(written, cd_size);
        self.cursor += cd_size;

        let mut tail = Vec::with_capacity(
            Zip64EOCD::MIN_SIZE + Zip64EOCDLocator::SIZE + EndOfCentralDirectory::SIZE,
        );
        if zip64 {
            let eocd64_offset = self.cursor;
            Zip64EOCD::new(entries, cd_size, cd_offset).write_to(&mut tail)?;
            Zip64EOCDLocator::new(eocd64_offset).write_to(&mut tail)?;
            EndOfCentralDirectory::zip64_sentinel(comment_len).write_to(&mut tail)?;
            debug!(entries, cd_size, cd_offset, "emitted ZIP64 end records");
        } else {
            EndOfCentralDirectory::classic(
                entries as u16,
                cd_size as u32,
                cd_offset as u32,
                comment_len,
            )
            .write_to(&mut tail)?;
        }
        tail.extend_from_slice(&self.comment);

        self.sink.write_all(&tail)?;
        self.sink.flush()?;
        self.cursor += tail.len() as u64;

        let summary = ArchiveSummary {
            entries,
            entries_added: self.entries_added,
            cd_offset,
            cd_size,
            zip64,
            archive_len: self.cursor,
        };
        Ok((self.sink, summary))
    }
}

impl<W: Read + Write + Seek + Truncate> ArchiveWriter<W> {
    /// Open a sink in the given mode.
    ///
    /// `Create` truncates the sink. `Append` keeps the entries of an archive
    /// already in the sink (see [`AppendPoint::locate`]).
    pub fn open(mut sink: W, mode: OpenMode, options: WriterOptions) -> Result<Self> {
        match mode {
            OpenMode::Create => {
                sink.truncate_at(0)?;
                sink.seek(SeekFrom::Start(0))?;
                Self::create(sink, options)
            }
            OpenMode::Append => {
                let point = AppendPoint::locate(&mut sink)?;
                check_resumable(&point, &options)?;
                point.prepare(&mut sink)?;
                Self::resume(sink, point, options)
            }
        }
    }
}

fn check_resumable(point: &AppendPoint, options: &WriterOptions) -> Result<()> {
    if point.existing_archive && !options.preamble.is_empty() {
        return Err(Error::UnsupportedMode(
            "a preamble cannot be inserted in front of an existing archive".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::codec::{CompressedData, CompressionCodec, StoredCodec};
    use crate::zip::structures::CDFH_MIN_SIZE;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn entry(name: &str, data: &[u8]) -> Entry {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        Entry::new(name, data, ts)
    }

    fn build(policy: Zip64Policy, entries: &[Entry]) -> (Vec<u8>, ArchiveSummary) {
        let options = WriterOptions::new().zip64(policy);
        let mut writer = ArchiveWriter::create(Vec::new(), options).unwrap();
        for e in entries {
            writer.write_entry(e).unwrap();
        }
        writer.finish().unwrap()
    }

    fn tail_eocd(bytes: &[u8]) -> EndOfCentralDirectory {
        EndOfCentralDirectory::from_bytes(&bytes[bytes.len() - EndOfCentralDirectory::SIZE..])
            .unwrap()
    }

    /// Reports 4 GiB for every non-empty entry without producing the bytes.
    struct HugeCodec;

    impl CompressionCodec for HugeCodec {
        fn method(&self) -> CompressionMethod {
            CompressionMethod::Stored
        }

        fn compress(&mut self, data: &[u8]) -> Result<CompressedData> {
            let size = if data.is_empty() { 0 } else { 0x1_0000_0000 };
            Ok(CompressedData {
                bytes: Vec::new(),
                crc32: crc32fast::hash(data),
                uncompressed_size: size,
                compressed_size: size,
            })
        }
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn auto_small_archive_has_classic_end_record() {
        let (bytes, summary) = build(Zip64Policy::Auto, &[entry("a.txt", b"hello")]);
        assert!(!summary.zip64);
        assert_eq!(summary.archive_len, bytes.len() as u64);

        let eocd = tail_eocd(&bytes);
        assert_eq!(eocd.total_entries, 1);
        assert_eq!(eocd.disk_entries, 1);
        assert_eq!(eocd.cd_offset as u64, summary.cd_offset);
        assert_eq!(eocd.cd_size as u64, summary.cd_size);
        assert!(!eocd.is_zip64());

        let lfh = LocalFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(lfh.extra_field_length, 0);
        assert_eq!(lfh.uncompressed_size, 5);
        assert_eq!(lfh.version_needed, VERSION_DEFAULT);
    }

    #[test]
    fn force_writes_sentinels_and_zip64_records() {
        let (bytes, summary) = build(Zip64Policy::Force, &[entry("a.txt", b"hello")]);
        assert!(summary.zip64);

        let n = bytes.len();
        assert_eq!(&bytes[n - 14..n - 2], &[0xFF; 12]);
        assert_eq!(&bytes[n - 2..], &[0, 0]);
        assert!(tail_eocd(&bytes).has_all_sentinels());

        let locator_at = n - EndOfCentralDirectory::SIZE - Zip64EOCDLocator::SIZE;
        let locator = Zip64EOCDLocator::from_bytes(&bytes[locator_at..]).unwrap();
        let eocd64_at = locator_at - Zip64EOCD::MIN_SIZE;
        assert_eq!(locator.eocd64_offset, eocd64_at as u64);

        let eocd64 = Zip64EOCD::from_bytes(&bytes[eocd64_at..]).unwrap();
        assert_eq!(eocd64.total_entries, 1);
        assert_eq!(eocd64.cd_offset, summary.cd_offset);
        assert_eq!(eocd64.cd_size, summary.cd_size);
        assert_eq!(eocd64.cd_offset + eocd64.cd_size, eocd64_at as u64);
    }

    #[test]
    fn force_puts_both_sizes_in_the_local_header() {
        let (bytes, _) = build(Zip64Policy::Force, &[entry("e", b"")]);
        let lfh = LocalFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(lfh.version_needed, VERSION_ZIP64);
        assert_eq!(lfh.compressed_size, ZIP64_SENTINEL_32);
        assert_eq!(lfh.uncompressed_size, ZIP64_SENTINEL_32);
        assert_eq!(lfh.extra_field_length, 20);

        let extra = &bytes[LFH_SIZE + 1..LFH_SIZE + 1 + 20];
        assert_eq!(&extra[0..4], &[0x01, 0x00, 16, 0]);
        assert_eq!(&extra[4..12], &0u64.to_le_bytes());
        // an empty deflate stream is two bytes
        assert_eq!(&extra[12..20], &2u64.to_le_bytes());
    }

    #[test]
    fn preamble_does_not_shift_offsets() {
        let options = WriterOptions::new().preamble(*b"#!xx");
        let mut writer = ArchiveWriter::create(Vec::new(), options).unwrap();
        writer.write_entry(&entry("a.txt", b"hello")).unwrap();
        let (bytes, summary) = writer.finish().unwrap();

        assert_eq!(&bytes[..4], b"#!xx");
        assert_eq!(&bytes[4..8], b"PK\x03\x04");
        assert_eq!(bytes.len() as u64, summary.archive_len + 4);

        let eocd = tail_eocd(&bytes);
        let cd_at = 4 + eocd.cd_offset as usize;
        assert_eq!(&bytes[cd_at..cd_at + 4], b"PK\x01\x02");
        // first local header sits at payload offset 0
        assert_eq!(&bytes[cd_at + 42..cd_at + 46], &[0, 0, 0, 0]);
    }

    #[test]
    fn offsets_advance_by_header_and_payload() {
        let mut writer = ArchiveWriter::create(Vec::new(), WriterOptions::new())
            .unwrap()
            .with_codec(Box::new(StoredCodec));
        writer.write_entry(&entry("a", b"12345")).unwrap();
        writer.write_entry(&entry("bc", b"xy")).unwrap();
        let (_, summary) = writer.finish().unwrap();

        let first = (LFH_SIZE + 1 + 5) as u64;
        let second = (LFH_SIZE + 2 + 2) as u64;
        assert_eq!(summary.cd_offset, first + second);
        assert_eq!(summary.cd_size, (2 * CDFH_MIN_SIZE + 3) as u64);
    }

    #[test]
    fn non_ascii_names_set_the_utf8_flag() {
        let (bytes, _) = build(Zip64Policy::Auto, &[entry("übung.txt", b"x")]);
        let lfh = LocalFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(lfh.flags & FLAG_UTF8, FLAG_UTF8);
    }

    #[test]
    fn invalid_names_are_rejected_before_writing() {
        let mut writer = ArchiveWriter::create(Vec::new(), WriterOptions::new()).unwrap();
        let err = writer.write_entry(&entry("../evil", b"x")).unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
        assert!(writer.is_empty());
    }

    #[test]
    fn never_refuses_large_entry_counts() {
        let mut writer = ArchiveWriter::create(
            Vec::new(),
            WriterOptions::new().zip64(Zip64Policy::Never),
        )
        .unwrap()
        .with_codec(Box::new(StoredCodec));
        for i in 0..ZIP64_SENTINEL_16 as u32 {
            writer.write_entry(&entry(&format!("{i}"), b"")).unwrap();
        }
        assert!(matches!(writer.finish(), Err(Error::FormatPrecondition(_))));
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        let entries = [entry("a.txt", b"hello"), entry("dir/b.bin", &[7u8; 300])];
        let (first, _) = build(Zip64Policy::Force, &entries);
        let (second, _) = build(Zip64Policy::Force, &entries);
        assert_eq!(first, second);
    }

    #[test]
    fn open_create_truncates_the_sink() {
        let sink = Cursor::new(b"stale bytes that must disappear".to_vec());
        let mut writer = ArchiveWriter::open(sink, OpenMode::Create, WriterOptions::new()).unwrap();
        writer.write_entry(&entry("a", b"1")).unwrap();
        let (sink, summary) = writer.finish().unwrap();
        assert_eq!(sink.get_ref().len() as u64, summary.archive_len);
        assert_eq!(&sink.get_ref()[..4], b"PK\x03\x04");
    }

    #[test]
    fn auto_promotes_sizes_and_offsets_past_four_gib() {
        let mut writer = ArchiveWriter::create(Vec::new(), WriterOptions::new())
            .unwrap()
            .with_codec(Box::new(HugeCodec));
        writer.write_entry(&entry("a", b"x")).unwrap();
        writer.write_entry(&entry("b", b"")).unwrap();
        let (bytes, summary) = writer.finish().unwrap();

        // first local header: sizes deferred to a 20-byte ZIP64 extra
        let lfh = LocalFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(lfh.version_needed, VERSION_ZIP64);
        assert_eq!(lfh.compressed_size, ZIP64_SENTINEL_32);
        assert_eq!(lfh.uncompressed_size, ZIP64_SENTINEL_32);
        assert_eq!(lfh.extra_field_length, 20);
        let extra = &bytes[LFH_SIZE + 1..LFH_SIZE + 21];
        assert_eq!(&extra[0..4], &[0x01, 0x00, 16, 0]);
        assert_eq!(&extra[4..12], &0x1_0000_0000u64.to_le_bytes());
        assert_eq!(&extra[12..20], &0x1_0000_0000u64.to_le_bytes());

        // second local header: small sizes, but it sits past 4 GiB
        let second_at = LFH_SIZE + 21;
        let lfh = LocalFileHeader::from_bytes(&bytes[second_at..]).unwrap();
        assert_eq!(lfh.version_needed, VERSION_ZIP64);
        assert_eq!(lfh.compressed_size, 0);
        assert_eq!(lfh.extra_field_length, 0);

        let second_offset = (LFH_SIZE + 21) as u64 + 0x1_0000_0000;
        assert_eq!(summary.cd_offset, second_offset + (LFH_SIZE + 1) as u64);
        assert_eq!(summary.cd_size, (2 * CDFH_MIN_SIZE + 2 + 20 + 12) as u64);
        assert!(summary.zip64);

        // central directory: only the values that overflow are promoted
        let first = second_at + LFH_SIZE + 1;
        assert_eq!(&bytes[first..first + 4], b"PK\x01\x02");
        assert_eq!(u32_at(&bytes, first + 20), ZIP64_SENTINEL_32);
        assert_eq!(u32_at(&bytes, first + 24), ZIP64_SENTINEL_32);
        assert_eq!(u16_at(&bytes, first + 30), 20);
        assert_eq!(u32_at(&bytes, first + 42), 0);

        let second = first + CDFH_MIN_SIZE + 1 + 20;
        assert_eq!(&bytes[second..second + 4], b"PK\x01\x02");
        assert_eq!(u32_at(&bytes, second + 20), 0);
        assert_eq!(u16_at(&bytes, second + 30), 12);
        assert_eq!(u32_at(&bytes, second + 42), ZIP64_SENTINEL_32);
        let extra = &bytes[second + CDFH_MIN_SIZE + 1..second + CDFH_MIN_SIZE + 13];
        assert_eq!(&extra[0..4], &[0x01, 0x00, 8, 0]);
        assert_eq!(&extra[4..12], &second_offset.to_le_bytes());

        // end records carry the real directory position
        let n = bytes.len();
        assert_eq!(second + CDFH_MIN_SIZE + 13, n - 98);
        assert!(tail_eocd(&bytes).has_all_sentinels());
        let eocd64_at =
            n - EndOfCentralDirectory::SIZE - Zip64EOCDLocator::SIZE - Zip64EOCD::MIN_SIZE;
        let eocd64 = Zip64EOCD::from_bytes(&bytes[eocd64_at..]).unwrap();
        assert_eq!(eocd64.total_entries, 2);
        assert_eq!(eocd64.cd_offset, summary.cd_offset);
        assert_eq!(eocd64.cd_size, summary.cd_size);
    }

    #[test]
    fn never_refuses_entries_past_four_gib() {
        let mut writer = ArchiveWriter::create(
            Vec::new(),
            WriterOptions::new().zip64(Zip64Policy::Never),
        )
        .unwrap()
        .with_codec(Box::new(HugeCodec));
        let err = writer.write_entry(&entry("a", b"x")).unwrap_err();
        assert!(matches!(err, Error::FormatPrecondition(_)));
        assert!(writer.is_empty());
    }
}
