//! Shared helpers for the integration tests.
//!
//! Each test file compiles as its own crate and uses only part of this
//! module, hence the `dead_code` allowance.

#![allow(dead_code)]

use std::io::{Cursor, Read};

use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::DeflateDecoder;
use zipbuild::zip::EndOfCentralDirectory;
use zipbuild::{
    ArchiveSummary, ArchiveWriter, CompressionMethod, Entry, WriterOptions, Zip64Policy, ZipParser,
};

/// A fixed timestamp so repeated builds are comparable.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 11, 2)
        .unwrap()
        .and_hms_opt(8, 15, 42)
        .unwrap()
}

pub fn entries(items: &[(&str, &[u8])]) -> Vec<Entry> {
    items
        .iter()
        .map(|(name, data)| Entry::new(*name, *data, fixed_time()))
        .collect()
}

/// Write `entries` into an in-memory archive.
pub fn write_archive(options: WriterOptions, entries: &[Entry]) -> (Vec<u8>, ArchiveSummary) {
    let mut writer = ArchiveWriter::create(Vec::new(), options).expect("create writer");
    for entry in entries {
        writer.write_entry(entry).expect("write entry");
    }
    writer.finish().expect("finish archive")
}

pub fn archive_with(policy: Zip64Policy, items: &[(&str, &[u8])]) -> Vec<u8> {
    write_archive(WriterOptions::new().zip64(policy), &entries(items)).0
}

/// Classic EOCD at the end of a comment-less archive.
pub fn trailing_eocd(bytes: &[u8]) -> EndOfCentralDirectory {
    EndOfCentralDirectory::from_bytes(&bytes[bytes.len() - EndOfCentralDirectory::SIZE..])
        .expect("EOCD at the end")
}

/// Name and contents of every entry, read with the `zip` crate.
pub fn read_with_zip_crate(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip crate opens archive");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("entry data");
            (file.name().to_string(), data)
        })
        .collect()
}

/// Name, contents and stored CRC of every entry, read with our parser.
pub fn read_with_parser(bytes: &[u8]) -> Vec<(String, Vec<u8>, u32)> {
    let parser = ZipParser::new(bytes);
    let index = parser.index().expect("index archive");
    index
        .records
        .iter()
        .map(|record| {
            let raw = parser.raw_data(&index, record).expect("raw data");
            let data = match record.compression_method {
                CompressionMethod::Stored => raw,
                CompressionMethod::Deflate => inflate(&raw),
                other => panic!("unexpected method {other:?}"),
            };
            (record.name().into_owned(), data, record.crc32)
        })
        .collect()
}

pub fn inflate(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    DeflateDecoder::new(bytes)
        .read_to_end(&mut out)
        .expect("valid deflate stream");
    out
}
