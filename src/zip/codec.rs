//! Entry compression.
//!
//! The writer only needs one capability from a compressor: turn an entry's
//! raw bytes into the bytes stored in the archive, together with the CRC-32
//! and both sizes. [`CompressionCodec`] is that seam; [`DeflateCodec`] and
//! [`StoredCodec`] are the two implementations.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;

use super::structures::CompressionMethod;
use crate::error::{Error, Result};

/// Output of compressing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub bytes: Vec<u8>,
    pub crc32: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// A compressor the archive writer can plug in.
///
/// Implementations must be deterministic: identical input produces
/// identical output.
pub trait CompressionCodec {
    /// Method ID recorded in the entry headers.
    fn method(&self) -> CompressionMethod;

    fn compress(&mut self, data: &[u8]) -> Result<CompressedData>;
}

/// Raw DEFLATE (method 8), reusing one encoder across entries.
pub struct DeflateCodec {
    encoder: DeflateEncoder<Vec<u8>>,
}

impl DeflateCodec {
    /// `level` is clamped to zlib's 0..=9.
    pub fn new(level: u32) -> Self {
        Self {
            encoder: DeflateEncoder::new(Vec::new(), Compression::new(level.min(9))),
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new(Compression::default().level())
    }
}

impl CompressionCodec for DeflateCodec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }

    fn compress(&mut self, data: &[u8]) -> Result<CompressedData> {
        self.encoder.write_all(data).map_err(Error::Compression)?;
        // finishes the stream into the old buffer and starts a fresh one
        let bytes = self.encoder.reset(Vec::new()).map_err(Error::Compression)?;

        Ok(CompressedData {
            crc32: crc32fast::hash(data),
            uncompressed_size: data.len() as u64,
            compressed_size: bytes.len() as u64,
            bytes,
        })
    }
}

/// No compression (method 0).
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredCodec;

impl CompressionCodec for StoredCodec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Stored
    }

    fn compress(&mut self, data: &[u8]) -> Result<CompressedData> {
        Ok(CompressedData {
            bytes: data.to_vec(),
            crc32: crc32fast::hash(data),
            uncompressed_size: data.len() as u64,
            compressed_size: data.len() as u64,
        })
    }
}

/// Build the codec for a method; only stored and deflate can be written.
pub fn codec_for(method: CompressionMethod, level: u32) -> Result<Box<dyn CompressionCodec>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredCodec)),
        CompressionMethod::Deflate => Ok(Box::new(DeflateCodec::new(level))),
        CompressionMethod::Unknown(id) => Err(Error::UnsupportedMode(format!(
            "compression method {id} cannot be written"
        ))),
    }
}
