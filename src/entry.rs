//! Entries fed to the archive writer.

use std::fs;
use std::path::{Component, Path};

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::warn;

use crate::error::{Error, Result};

/// Unix mode recorded for entries that do not come from the filesystem:
/// a regular file with `rw-r--r--`.
pub const DEFAULT_UNIX_MODE: u32 = 0o100644;

/// One file to store in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Archive-relative, `/` separated name.
    pub name: String,
    pub data: Vec<u8>,
    /// Local wall-clock modification time.
    pub modified: NaiveDateTime,
    pub unix_mode: Option<u32>,
}

impl Entry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>, modified: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            modified,
            unix_mode: Some(DEFAULT_UNIX_MODE),
        }
    }

    pub fn with_unix_mode(mut self, mode: Option<u32>) -> Self {
        self.unix_mode = mode;
        self
    }

    /// Read a regular file, naming it after its (normalised) path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = archive_name(path)?;
        let unreadable = |e: std::io::Error| Error::InvalidInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let metadata = fs::metadata(path).map_err(unreadable)?;
        let data = fs::read(path).map_err(unreadable)?;

        let modified = metadata
            .modified()
            .map(|t| DateTime::<Local>::from(t).naive_local())
            .unwrap_or_default();

        #[cfg(unix)]
        let unix_mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode() & 0xFFFF)
        };
        #[cfg(not(unix))]
        let unix_mode = None;

        Ok(Self {
            name,
            data,
            modified,
            unix_mode,
        })
    }
}

/// Derive the archive name for a filesystem path.
///
/// The path is normalised lexically: `.` components vanish, `dir/..`
/// pairs cancel, any root or drive prefix is dropped and separators become
/// `/`. A `..` that would climb above the first component is dropped with
/// a warning, so `../data/a.txt` is stored as `data/a.txt`.
pub fn archive_name(path: &Path) -> Result<String> {
    let shown = path.to_string_lossy();
    let mut parts: Vec<&str> = Vec::new();
    let mut climbed = false;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    climbed = true;
                }
            }
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| Error::invalid_name(shown.clone(), "not valid UTF-8"))?;
                parts.push(part);
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::invalid_name(shown, "empty after normalisation"));
    }
    let name = parts.join("/");
    if climbed {
        warn!(path = %shown, name = %name, "dropping leading '..' from entry name");
    }
    Ok(name)
}

/// Check that a name can be stored as-is.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name(name, "empty name"));
    }
    if name.starts_with('/') {
        return Err(Error::invalid_name(name, "absolute name"));
    }
    if name.contains('\0') {
        return Err(Error::invalid_name(name, "contains a NUL byte"));
    }
    if name.split('/').any(|part| part == "..") {
        return Err(Error::invalid_name(name, "escapes the archive root"));
    }
    if name.len() > u16::MAX as usize {
        return Err(Error::NameTooLong {
            name: name.to_owned(),
            len: name.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn names_are_normalised() {
        assert_eq!(archive_name(Path::new("a.txt")).unwrap(), "a.txt");
        assert_eq!(archive_name(Path::new("./dir/./b.txt")).unwrap(), "dir/b.txt");
        assert_eq!(archive_name(Path::new("dir/sub/../c")).unwrap(), "dir/c");
        assert_eq!(archive_name(Path::new("/abs/path/x")).unwrap(), "abs/path/x");
    }

    #[test]
    fn names_never_climb_above_the_root() {
        assert_eq!(archive_name(Path::new("../data/a.txt")).unwrap(), "data/a.txt");
        assert_eq!(archive_name(Path::new("../../x")).unwrap(), "x");
        assert_eq!(archive_name(Path::new("a/../../b")).unwrap(), "b");
        assert!(matches!(
            archive_name(Path::new("..")),
            Err(Error::InvalidName { .. })
        ));
        assert!(matches!(
            archive_name(Path::new(".")),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn validation() {
        assert!(validate_name("dir/file.txt").is_ok());
        assert!(validate_name("héllo.txt").is_ok());
        assert!(matches!(validate_name(""), Err(Error::InvalidName { .. })));
        assert!(matches!(validate_name("/etc/passwd"), Err(Error::InvalidName { .. })));
        assert!(matches!(validate_name("a/../../b"), Err(Error::InvalidName { .. })));
        assert!(matches!(validate_name("nul\0"), Err(Error::InvalidName { .. })));
        assert!(matches!(
            validate_name(&"x".repeat(70_000)),
            Err(Error::NameTooLong { len: 70_000, .. })
        ));
    }

    #[test]
    fn from_path_reads_content_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();

        let entry = Entry::from_path(&file).unwrap();
        assert_eq!(entry.data, b"hello");
        assert!(entry.name.ends_with("a.txt"));
        assert!(!entry.name.starts_with('/'));
        #[cfg(unix)]
        assert_eq!(entry.unix_mode.unwrap() & 0o170000, 0o100000);
    }

    #[test]
    fn from_path_reports_missing_files() {
        let missing = PathBuf::from("definitely/not/here.txt");
        assert!(matches!(
            Entry::from_path(&missing),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn from_path_reports_unreadable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        // metadata succeeds, reading the contents does not
        assert!(matches!(
            Entry::from_path(&sub),
            Err(Error::InvalidInput { .. })
        ));
    }
}
