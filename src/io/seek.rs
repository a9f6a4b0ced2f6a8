use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};

use super::ReadAt;
use crate::error::Result;

/// Positional reads over a borrowed `Read + Seek` stream.
///
/// Used to index an archive through the same handle that will later be
/// written to. The stream position is left wherever the last read ended.
pub struct SeekReader<'a, R: Read + Seek> {
    inner: RefCell<&'a mut R>,
    size: u64,
}

impl<'a, R: Read + Seek> SeekReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: RefCell::new(inner),
            size,
        })
    }
}

impl<R: Read + Seek> ReadAt for SeekReader<'_, R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.borrow_mut();
        inner.seek(SeekFrom::Start(offset))?;
        Ok(inner.read(buf)?)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
