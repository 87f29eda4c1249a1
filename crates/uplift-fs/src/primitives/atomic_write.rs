use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// How [`atomic_write`] commits.
#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    /// Flush file data to disk before the rename.
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(self, sync: bool) -> Self {
        Self { sync }
    }
}

/// Write `content` to a temporary sibling of `path`, then rename it into
/// place. Readers observe either the old or the new content, never a mix.
/// Missing parent directories are created.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let Some(parent) = path.parent() else {
        return Err(Error::NoParent {
            path: path.to_path_buf(),
        });
    };
    let write_err = |at: &Path| {
        let at = at.to_path_buf();
        move |source| Error::Write { path: at, source }
    };

    fs::create_dir_all(parent).map_err(write_err(parent))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".staged-")
        .tempfile_in(parent)
        .map_err(write_err(parent))?;

    let staged_path = staged.path().to_path_buf();
    staged.write_all(content).map_err(write_err(&staged_path))?;
    if options.sync {
        staged.as_file().sync_all().map_err(write_err(&staged_path))?;
    }

    staged
        .persist(path)
        .map(drop)
        .map_err(|e| write_err(path)(e.error))
}

/// Read a file written by [`atomic_write`].
pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
