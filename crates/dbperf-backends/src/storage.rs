//! Storage directory handling shared by all backends.

use std::fs;
use std::io;
use std::path::Path;

/// Remove `path` if it exists and create it empty.
pub(crate) fn reset_dir(path: &Path) -> io::Result<()> {
    remove_dir(path)?;
    fs::create_dir_all(path)
}

/// Remove `path` and everything below it. Missing directories are fine.
pub(crate) fn remove_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Size of a single file in bytes.
pub(crate) fn file_size(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}
