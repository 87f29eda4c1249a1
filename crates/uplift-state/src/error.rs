use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write release cache")]
    Write(#[source] uplift_fs::Error),

    #[error("failed to encode release cache: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to scan '{path}': {source}")]
    ScanDir { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
