use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn read_err(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_err(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Recursively copy `src` into `dest`, creating `dest` if needed.
///
/// Files keep their permission bits. Symlinks are recreated as links on Unix
/// and copied through on other platforms. The tree is walked with an explicit
/// stack so deep installations cannot overflow.
pub fn copy_dir_all(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.as_ref().into(), dest.as_ref().into())];

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to).map_err(write_err(&to))?;

        for entry in fs::read_dir(&from).map_err(read_err(&from))? {
            let entry = entry.map_err(read_err(&from))?;
            let from_path = entry.path();
            let to_path = to.join(entry.file_name());
            let file_type = entry.file_type().map_err(read_err(&from_path))?;

            if file_type.is_dir() {
                pending.push((from_path, to_path));
            } else if file_type.is_symlink() {
                copy_symlink(&from_path, &to_path)?;
            } else {
                fs::copy(&from_path, &to_path).map_err(write_err(&to_path))?;
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
pub(crate) fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(read_err(src))?;
    std::os::unix::fs::symlink(target, dest).map_err(write_err(dest))
}

#[cfg(not(unix))]
pub(crate) fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest).map(|_| ()).map_err(write_err(dest))
}
