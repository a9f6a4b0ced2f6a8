use std::fs::File;
use std::path::Path;

use super::ReadAt;
use crate::error::{Error, Result};

/// Positional reads from an archive on disk.
///
/// This is the reader for finished archives; pair it with
/// [`ZipParser`](crate::ZipParser) to list or check what a build produced.
/// Appending reads the open output through
/// [`SeekReader`](super::SeekReader) instead.
///
/// ```no_run
/// use std::path::Path;
/// use zipbuild::{LocalFileReader, ZipParser};
///
/// let reader = LocalFileReader::new(Path::new("out.zip"))?;
/// let index = ZipParser::new(&reader).index()?;
/// println!("{} entries", index.records.len());
/// # Ok::<(), zipbuild::Error>(())
/// ```
///
/// The size is captured when the reader is created; bytes appended later
/// are not visible.
pub struct LocalFileReader {
    file: File,
    size: u64,
}

impl LocalFileReader {
    /// Open `path` for reading. A missing or unreadable file is reported
    /// as [`Error::InvalidInput`].
    pub fn new(path: &Path) -> Result<Self> {
        let invalid = |e: std::io::Error| Error::InvalidInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let file = File::open(path).map_err(invalid)?;
        let size = file.metadata().map_err(invalid)?.len();
        Ok(Self { file, size })
    }

    /// Wrap a file that is already open, e.g. a finished output.
    pub fn from_file(file: File) -> Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let len = buf.len().min((self.size - offset).min(usize::MAX as u64) as usize);
        let buf = &mut buf[..len];

        #[cfg(unix)]
        let n = {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)?
        };

        #[cfg(windows)]
        let n = {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)?
        };

        #[cfg(not(any(unix, windows)))]
        let n = {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            file.read(buf)?
        };

        Ok(n)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
