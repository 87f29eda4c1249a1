use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to replace '{path}': {source}")]
    Replace { path: PathBuf, source: io::Error },

    #[error("'{path}' is locked by another process")]
    Locked { path: PathBuf },

    #[error("'{path}' has no parent directory")]
    NoParent { path: PathBuf },
}

impl Error {
    /// The path the failed operation was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::Read { path, .. }
            | Error::Write { path, .. }
            | Error::Remove { path, .. }
            | Error::Replace { path, .. }
            | Error::Locked { path }
            | Error::NoParent { path } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
