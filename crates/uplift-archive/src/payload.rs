use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The directory whose children are the real payload.
///
/// Source-archive downloads wrap everything in one `<repo>-<tag>/`
/// directory while uploaded assets usually list files directly. When
/// `extracted` holds exactly one entry and it is a directory, that directory
/// is the payload root; otherwise `extracted` itself is.
pub fn payload_root(extracted: &Path) -> Result<PathBuf> {
    let read_err = |source| Error::ReadDir {
        path: extracted.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(extracted).map_err(read_err)?;
    let first = match entries.next() {
        Some(entry) => entry.map_err(read_err)?,
        None => return Ok(extracted.to_path_buf()),
    };
    if entries.next().is_some() {
        return Ok(extracted.to_path_buf());
    }

    let is_dir = first.file_type().map_err(read_err)?.is_dir();
    Ok(if is_dir {
        first.path()
    } else {
        extracted.to_path_buf()
    })
}
