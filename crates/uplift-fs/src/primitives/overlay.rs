use crate::primitives::copy_dir::{copy_dir_all, copy_symlink};
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Missing,
}

/// Classify `path` without following a trailing symlink.
pub fn entry_kind(path: impl AsRef<Path>) -> Result<EntryKind> {
    let path = path.as_ref();
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(EntryKind::Symlink),
        Ok(meta) if meta.is_dir() => Ok(EntryKind::Dir),
        Ok(_) => Ok(EntryKind::File),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
        Err(e) => Err(Error::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Remove a file, link or directory tree. Removing a missing path is a no-op.
pub fn remove_entry(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = match entry_kind(path)? {
        EntryKind::Missing => return Ok(()),
        EntryKind::Dir => fs::remove_dir_all(path),
        EntryKind::File | EntryKind::Symlink => fs::remove_file(path),
    };
    result.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Put `src` at `dest`, replacing whatever is there.
///
/// Files overwrite the destination file. Directories replace the destination
/// tree wholesale, so entries that only exist under the old `dest` are gone
/// afterwards. A type change (file to directory or back) removes the old
/// entry first.
pub fn overlay_entry(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    match entry_kind(src)? {
        EntryKind::Missing => Err(Error::Read {
            path: src.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        }),
        EntryKind::Dir => {
            remove_entry(dest)?;
            copy_dir_all(src, dest).map_err(|e| match e {
                Error::Write { path, source } => Error::Replace { path, source },
                other => other,
            })
        }
        EntryKind::Symlink => {
            remove_entry(dest)?;
            copy_symlink(src, dest)
        }
        EntryKind::File => {
            if matches!(entry_kind(dest)?, EntryKind::Dir | EntryKind::Symlink) {
                remove_entry(dest)?;
            }
            fs::copy(src, dest).map(|_| ()).map_err(|e| Error::Write {
                path: dest.to_path_buf(),
                source: e,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_overlay_file_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("new.txt");
        let dest = dir.path().join("old.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        overlay_entry(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_overlay_dir_replaces_instead_of_merging() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("kept.txt"), "new").unwrap();
        fs::write(dest.join("kept.txt"), "old").unwrap();
        fs::write(dest.join("stale.txt"), "stale").unwrap();

        overlay_entry(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("kept.txt")).unwrap(), "new");
        assert!(!dest.join("stale.txt").exists());
    }

    #[test]
    fn test_overlay_file_over_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("file");
        let dest = dir.path().join("target");
        fs::write(&src, "flat").unwrap();
        fs::create_dir_all(dest.join("inner")).unwrap();

        overlay_entry(&src, &dest).unwrap();
        assert_eq!(entry_kind(&dest).unwrap(), EntryKind::File);
    }

    #[test]
    fn test_overlay_creates_parent() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "a").unwrap();
        let dest = dir.path().join("deep/er/a.txt");

        overlay_entry(&src, &dest).unwrap();
        assert!(dest.exists());
    }

    #[test]
    fn test_remove_entry_missing_is_noop() {
        let dir = tempdir().unwrap();
        remove_entry(dir.path().join("missing")).unwrap();
    }
}
