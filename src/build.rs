//! Building an archive on disk from input paths.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::entry::Entry;
use crate::error::Result;
use crate::walk::traverse;
use crate::zip::{
    ArchiveSummary, ArchiveWriter, CompressionMethod, OpenMode, WriterOptions, Zip64Policy,
};

/// Everything one build needs.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Archive to create or append to.
    pub archive: PathBuf,
    /// Files and directories to add, in order.
    pub inputs: Vec<PathBuf>,
    pub mode: OpenMode,
    /// Bytes written before the archive payload.
    pub preamble: Vec<u8>,
    pub zip64: Zip64Policy,
    pub method: CompressionMethod,
    pub level: u32,
}

impl BuildOptions {
    pub fn new(archive: impl Into<PathBuf>, inputs: Vec<PathBuf>) -> Self {
        let defaults = WriterOptions::default();
        Self {
            archive: archive.into(),
            inputs,
            mode: OpenMode::Create,
            preamble: defaults.preamble,
            zip64: defaults.zip64,
            method: defaults.method,
            level: defaults.level,
        }
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions::new()
            .zip64(self.zip64)
            .method(self.method)
            .level(self.level)
            .preamble(self.preamble.clone())
    }
}

/// Add every regular file reachable from the inputs to the archive.
///
/// The archive file itself is never added, even when it lies inside an
/// input directory. Any error aborts the build; the partially written
/// archive is left on disk.
pub fn build_archive(options: &BuildOptions) -> Result<ArchiveSummary> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(options.mode == OpenMode::Create)
        .open(&options.archive)?;
    let archive_path = fs::canonicalize(&options.archive)?;

    let mut writer = ArchiveWriter::open(file, options.mode, options.writer_options())?;

    for path in traverse(options.inputs.iter().cloned()) {
        let path = path?;
        if fs::canonicalize(&path).is_ok_and(|p| p == archive_path) {
            warn!(path = %path.display(), "not adding the archive to itself");
            continue;
        }

        let entry = Entry::from_path(&path)?;
        info!(name = %entry.name, size = entry.data.len(), "adding");
        writer.write_entry(&entry)?;
    }

    let (file, summary) = writer.finish()?;
    file.sync_all()?;

    info!(
        entries = summary.entries,
        added = summary.entries_added,
        zip64 = summary.zip64,
        "archive written to {}",
        options.archive.display()
    );
    Ok(summary)
}
