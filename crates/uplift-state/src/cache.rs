use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplift_fs::{AtomicWriteOptions, atomic_read, atomic_write};
use uplift_source::ReleaseInfo;

use crate::error::{Error, Result};

/// A cached release and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub release: ReleaseInfo,
    pub captured_at: DateTime<Utc>,
}

/// Last release seen online, kept so a later offline run can still offer
/// it.
#[derive(Debug, Clone)]
pub struct OfflineCache {
    path: PathBuf,
}

impl OfflineCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the cached release.
    pub fn save(&self, release: &ReleaseInfo) -> Result<CacheEntry> {
        let entry = CacheEntry {
            release: release.clone(),
            captured_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&entry)?;
        atomic_write(&self.path, &json, AtomicWriteOptions::new().sync(true))
            .map_err(Error::Write)?;
        tracing::debug!(
            path = %self.path.display(),
            version = %release.version,
            "release cached"
        );
        Ok(entry)
    }

    /// The cached entry, or `None` when there is no usable cache. Never
    /// fails: a missing, unreadable or malformed file all read as absent.
    pub fn load(&self) -> Option<CacheEntry> {
        let bytes = match atomic_read(&self.path) {
            Ok(bytes) => bytes,
            Err(uplift_fs::Error::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no release cache");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "release cache unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "release cache malformed");
                None
            }
        }
    }
}
