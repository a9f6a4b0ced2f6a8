//! Expanding input paths into the regular files to archive.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Lazy, deterministic expansion of input paths into regular files.
///
/// Inputs are visited in the order given. Directories are walked depth
/// first with the children of every directory sorted by file name, so the
/// same tree always yields the same sequence. Symbolic links are followed.
///
/// A named input that does not exist is an [`Error::InvalidInput`].
/// Anything found while walking that is neither a regular file nor a
/// directory (sockets, FIFOs, devices, dangling links) is skipped with a
/// warning.
pub struct Traverse {
    inputs: std::vec::IntoIter<PathBuf>,
    walker: Option<walkdir::IntoIter>,
}

impl Traverse {
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .into_iter(),
            walker: None,
        }
    }

    fn next_in_directory(&mut self) -> Option<Result<PathBuf>> {
        let walker = self.walker.as_mut()?;
        for entry in walker.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_dangling_link(&e) => {
                    if let Some(path) = e.path() {
                        warn!(path = %path.display(), "ignoring dangling symbolic link");
                    }
                    continue;
                }
                Err(e) => return Some(Err(Error::Io(io::Error::from(e)))),
            };
            let file_type = entry.file_type();
            if file_type.is_file() {
                return Some(Ok(entry.into_path()));
            }
            if !file_type.is_dir() {
                warn!(path = %entry.path().display(), "ignoring unknown file type");
            }
        }
        self.walker = None;
        None
    }
}

impl Iterator for Traverse {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.next_in_directory() {
                return Some(item);
            }

            let path = self.inputs.next()?;
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    return Some(Err(Error::InvalidInput {
                        path,
                        reason: e.to_string(),
                    }));
                }
            };

            if metadata.is_file() {
                return Some(Ok(path));
            } else if metadata.is_dir() {
                debug!(path = %path.display(), "walking directory");
                self.walker = Some(
                    WalkDir::new(path)
                        .follow_links(true)
                        .sort_by_file_name()
                        .min_depth(1)
                        .into_iter(),
                );
            } else {
                warn!(path = %path.display(), "ignoring unknown file type");
            }
        }
    }
}

/// A link whose target is gone fails with `NotFound` while following it.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    let not_found = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    not_found
        && err
            .path()
            .and_then(|path| fs::symlink_metadata(path).ok())
            .is_some_and(|metadata| metadata.file_type().is_symlink())
}

/// Shorthand for [`Traverse::new`].
pub fn traverse<I, P>(inputs: I) -> Traverse
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    Traverse::new(inputs)
}
