//! Locating where new entries go when appending to an existing sink.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use super::central_directory::CentralDirectoryRecord;
use super::parser::ZipParser;
use crate::error::{Error, Result};
use crate::io::{ReadAt, SeekReader, Truncate};

/// Where an appending writer resumes, and what it inherits.
#[derive(Debug, Clone, Default)]
pub struct AppendPoint {
    /// Absolute sink position where writing resumes.
    pub resume_offset: u64,
    /// Payload-relative cursor at that position.
    pub cursor: u64,
    /// Central directory records of the entries that are kept.
    pub records: Vec<CentralDirectoryRecord>,
    pub comment: Vec<u8>,
    /// Whether an archive was found; if not, a fresh one starts at
    /// `resume_offset` and whatever precedes it acts as a prefix.
    pub existing_archive: bool,
}

impl AppendPoint {
    /// Index the sink to find where appending resumes.
    ///
    /// - An empty sink starts a fresh archive at offset 0.
    /// - A sink without an End of Central Directory record is kept intact
    ///   and a fresh archive starts after its last byte.
    /// - For an existing archive, writing resumes where its central
    ///   directory starts; the kept entries stay where they are and are
    ///   listed again by the new central directory.
    ///
    /// The sink is only read. Multi-disk archives are rejected with
    /// [`Error::UnsupportedMode`].
    pub fn locate<S: Read + Seek>(sink: &mut S) -> Result<Self> {
        let reader = SeekReader::new(sink)?;
        let parser = ZipParser::new(&reader);
        let len = reader.size();

        if len == 0 || parser.locate_eocd()?.is_none() {
            debug!(len, "no archive found, appending a fresh one");
            return Ok(AppendPoint {
                resume_offset: len,
                ..Default::default()
            });
        }

        let index = parser.index()?;
        let multi_disk = index.eocd.disk_number != 0
            || index.eocd.disk_with_cd != 0
            || index
                .zip64_eocd
                .as_ref()
                .is_some_and(|z| z.disk_number != 0 || z.disk_with_cd != 0)
            || index.zip64_locator.as_ref().is_some_and(|l| l.total_disks > 1);
        if multi_disk {
            return Err(Error::UnsupportedMode(
                "cannot append to a multi-disk archive".into(),
            ));
        }

        debug!(
            entries = index.records.len(),
            base_offset = index.base_offset,
            cd_offset = index.cd_offset,
            "appending to existing archive"
        );
        Ok(AppendPoint {
            resume_offset: index.base_offset + index.cd_offset,
            cursor: index.cd_offset,
            records: index.records,
            comment: index.comment,
            existing_archive: true,
        })
    }

    /// Cut off the old central directory and end records, and position the
    /// sink where writing resumes.
    pub fn prepare<S: Seek + Truncate>(&self, sink: &mut S) -> Result<()> {
        let len = sink.seek(SeekFrom::End(0))?;
        if self.existing_archive && self.resume_offset < len {
            sink.truncate_at(self.resume_offset)?;
        }
        sink.seek(SeekFrom::Start(self.resume_offset))?;
        Ok(())
    }
}
