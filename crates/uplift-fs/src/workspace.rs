use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory that is removed when dropped.
///
/// Use [`Workspace::close`] where the caller wants to hear about a failed
/// removal; dropping removes silently.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a scratch directory under `parent`.
    pub fn new_in(parent: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory now, reporting failure.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| Error::Remove { path, source: e })
    }
}
