use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to back up '{path}'")]
    Backup {
        path: PathBuf,
        #[source]
        source: uplift_fs::Error,
    },

    #[error("failed to extract update archive")]
    Extract(#[from] uplift_archive::Error),

    #[error("failed to apply '{path}'")]
    Apply {
        path: PathBuf,
        #[source]
        source: uplift_fs::Error,
    },

    #[error("snapshot at '{0}' was already discarded")]
    SnapshotDiscarded(PathBuf),

    #[error("rollback left {} path(s) unrestored, first: '{}'", failures.len(), first_failure(failures))]
    Rollback { failures: Vec<RollbackFailure> },

    #[error("{} overwritten path(s) are not in the backup, first: '{}'", paths.len(), first_path(paths))]
    Unrecoverable { paths: Vec<PathBuf> },

    #[error(transparent)]
    Fs(#[from] uplift_fs::Error),
}

/// One path rollback could not put back.
#[derive(Debug)]
pub struct RollbackFailure {
    pub path: PathBuf,
    pub source: uplift_fs::Error,
}

fn first_failure(failures: &[RollbackFailure]) -> String {
    failures
        .first()
        .map(|f| format!("{}: {}", f.path.display(), f.source))
        .unwrap_or_default()
}

fn first_path(paths: &[PathBuf]) -> String {
    paths.first().map(|p| p.display().to_string()).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
