use std::path::{Path, PathBuf};

use uplift_fs::{EntryKind, entry_kind, overlay_entry, remove_entry};

use crate::error::{Error, Result};
use crate::layout::InstallLayout;

/// Copy of the allow-listed installation paths taken before an apply, plus
/// whatever else the apply went on to overwrite.
///
/// Only [`BackupManager`] creates one, and there is at most one per
/// installation root since it always lives in the same directory.
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    dir: PathBuf,
    /// Copied items, relative to the root.
    entries: Vec<PathBuf>,
    /// Allow-listed items that did not exist when the snapshot was taken.
    absent: Vec<PathBuf>,
    discarded: bool,
}

impl BackupSnapshot {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn absent(&self) -> &[PathBuf] {
        &self.absent
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Whether `relative` is covered by the snapshot, either as a copied
    /// item or as a recorded absence.
    pub fn covers(&self, relative: &Path) -> bool {
        self.entries.iter().chain(&self.absent).any(|p| p == relative)
    }
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
    backup_dir: PathBuf,
    items: Vec<PathBuf>,
}

impl BackupManager {
    pub fn new(layout: &InstallLayout) -> Self {
        Self {
            root: layout.root().to_path_buf(),
            backup_dir: layout.backup_dir(),
            items: layout.backup_items().to_vec(),
        }
    }

    /// Snapshot the allow-listed items, replacing any abandoned backup.
    ///
    /// A copy failure removes the partial backup and fails the snapshot.
    pub fn snapshot(&self) -> Result<BackupSnapshot> {
        remove_entry(&self.backup_dir).map_err(|source| Error::Backup {
            path: self.backup_dir.clone(),
            source,
        })?;

        match self.copy_items() {
            Ok((entries, absent)) => {
                tracing::info!(
                    dir = %self.backup_dir.display(),
                    copied = entries.len(),
                    absent = absent.len(),
                    "backup created"
                );
                Ok(BackupSnapshot {
                    dir: self.backup_dir.clone(),
                    entries,
                    absent,
                    discarded: false,
                })
            }
            Err(e) => {
                if let Err(cleanup) = remove_entry(&self.backup_dir) {
                    tracing::warn!(error = %cleanup, "failed to remove partial backup");
                }
                Err(e)
            }
        }
    }

    fn copy_items(&self) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        std::fs::create_dir_all(&self.backup_dir).map_err(|e| Error::Backup {
            path: self.backup_dir.clone(),
            source: uplift_fs::Error::Write {
                path: self.backup_dir.clone(),
                source: e,
            },
        })?;

        let mut entries = Vec::new();
        let mut absent = Vec::new();
        for item in &self.items {
            let src = self.root.join(item);
            let kind = entry_kind(&src).map_err(|source| Error::Backup {
                path: src.clone(),
                source,
            })?;
            if kind == EntryKind::Missing {
                tracing::debug!(item = %item.display(), "backup item absent");
                absent.push(item.clone());
                continue;
            }
            overlay_entry(&src, self.backup_dir.join(item))
                .map_err(|source| Error::Backup { path: src, source })?;
            entries.push(item.clone());
        }
        Ok((entries, absent))
    }

    /// Copy one more root entry into `snapshot` ahead of overwriting it.
    ///
    /// Entries the snapshot already covers are left alone, so the copy taken
    /// before the apply wins.
    pub fn preserve(&self, snapshot: &mut BackupSnapshot, relative: &Path) -> Result<()> {
        if snapshot.discarded {
            return Err(Error::SnapshotDiscarded(snapshot.dir.clone()));
        }
        if snapshot.covers(relative) {
            return Ok(());
        }
        let src = self.root.join(relative);
        overlay_entry(&src, snapshot.dir.join(relative))
            .map_err(|source| Error::Backup { path: src, source })?;
        tracing::debug!(item = %relative.display(), "backed up path outside the allow-list");
        snapshot.entries.push(relative.to_path_buf());
        Ok(())
    }

    /// Remove the snapshot directory. Discarding twice is a no-op.
    pub fn discard(&self, snapshot: &mut BackupSnapshot) -> Result<()> {
        if snapshot.discarded {
            return Ok(());
        }
        remove_entry(&snapshot.dir)?;
        snapshot.discarded = true;
        tracing::debug!(dir = %snapshot.dir.display(), "backup discarded");
        Ok(())
    }
}
