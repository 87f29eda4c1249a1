use std::path::PathBuf;

use thiserror::Error;
use uplift_fetch::FetchError;
use uplift_source::SourceError;
use uplift_verify::VerificationError;

/// Failures of the update pipeline.
///
/// A check never returns these for network trouble; it degrades instead.
/// An apply returns `Err` only when it refused to start ([`UpdateError::Busy`]);
/// every other variant is reported inside an [`UpdateOutcome`](crate::UpdateOutcome).
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("network failure: {0}")]
    Network(#[from] FetchError),

    #[error("no usable download: {0}")]
    NoUsableAsset(#[source] SourceError),

    #[error("backup failed: {0}")]
    Backup(#[source] uplift_install::Error),

    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    #[error("rollback failed: {0}")]
    Rollback(#[source] uplift_install::Error),

    #[error("another update is already running")]
    Busy,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Install(#[from] uplift_install::Error),

    #[error("integrity check rejected '{path}'")]
    Rejected { path: PathBuf },

    #[error("integrity check failed: {0}")]
    Verify(#[from] VerificationError),

    #[error("overlay worker panicked")]
    Interrupted,

    #[error("failed to scan manual update directory: {0}")]
    ManualScan(#[source] uplift_state::Error),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
