use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive is corrupted: {0}")]
    Corrupted(#[source] zip::result::ZipError),

    #[error("archive contains no entries")]
    Empty,

    #[error("zip-slip attack detected: entry '{entry}' escapes the extraction directory")]
    ZipSlip { entry: String },

    #[error("entry path contains null byte")]
    InvalidPath,

    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to list '{path}': {source}")]
    ReadDir { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
