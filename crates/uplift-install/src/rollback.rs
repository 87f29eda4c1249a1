use std::path::{Path, PathBuf};

use uplift_fs::{EntryKind, entry_kind, overlay_entry, remove_entry};

use crate::backup::BackupSnapshot;
use crate::error::{Error, Result, RollbackFailure};
use crate::journal::ApplyJournal;
use crate::layout::InstallLayout;

/// What a rollback did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub restored: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Overwritten paths outside the snapshot; left as the apply wrote them.
    /// Empty whenever the journal came from [`UpdateApplier`](crate::UpdateApplier)
    /// overlaying against the same snapshot.
    pub unrecoverable: Vec<PathBuf>,
}

/// Puts the installation back the way a [`BackupSnapshot`] saw it.
#[derive(Debug, Clone)]
pub struct RollbackController {
    root: PathBuf,
}

impl RollbackController {
    pub fn new(layout: &InstallLayout) -> Self {
        Self {
            root: layout.root().to_path_buf(),
        }
    }

    /// Restore every snapshot entry, then remove what the apply created.
    ///
    /// Best-effort: every path is attempted and the failures are returned
    /// together.
    pub fn restore(&self, snapshot: &BackupSnapshot, journal: &ApplyJournal) -> Result<RollbackReport> {
        if snapshot.is_discarded() {
            return Err(Error::SnapshotDiscarded(snapshot.dir().to_path_buf()));
        }

        let mut report = RollbackReport::default();
        let mut failures = Vec::new();

        for item in snapshot.entries() {
            let dest = self.root.join(item);
            match overlay_entry(snapshot.dir().join(item), &dest) {
                Ok(()) => report.restored.push(item.clone()),
                Err(source) => failures.push(RollbackFailure { path: dest, source }),
            }
        }

        let created = snapshot
            .absent()
            .iter()
            .map(PathBuf::as_path)
            .chain(journal.created());
        for item in created {
            if report.removed.iter().any(|p| p == item) {
                continue;
            }
            let dest = self.root.join(item);
            match self.remove_if_present(&dest) {
                Ok(true) => report.removed.push(item.to_path_buf()),
                Ok(false) => {}
                Err(source) => failures.push(RollbackFailure { path: dest, source }),
            }
        }

        for item in journal.overwritten() {
            if !snapshot.covers(item) {
                tracing::warn!(
                    path = %item.display(),
                    "overwritten path is not in the backup and cannot be restored"
                );
                report.unrecoverable.push(item.to_path_buf());
            }
        }

        if failures.is_empty() {
            tracing::info!(
                restored = report.restored.len(),
                removed = report.removed.len(),
                "rollback complete"
            );
            Ok(report)
        } else {
            for failure in &failures {
                tracing::error!(path = %failure.path.display(), error = %failure.source, "rollback failed for path");
            }
            Err(Error::Rollback { failures })
        }
    }

    fn remove_if_present(&self, path: &Path) -> uplift_fs::Result<bool> {
        if entry_kind(path)? == EntryKind::Missing {
            return Ok(false);
        }
        remove_entry(path)?;
        Ok(true)
    }
}
