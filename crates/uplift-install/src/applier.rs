use std::ffi::OsString;
use std::path::{Path, PathBuf};

use uplift_archive::{extract_zip, payload_root};
use uplift_fs::{EntryKind, Workspace, entry_kind, overlay_entry};

use crate::backup::{BackupManager, BackupSnapshot};
use crate::error::{Error, Result};
use crate::journal::ApplyJournal;
use crate::layout::InstallLayout;

/// What an apply changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub extracted_entries: usize,
    /// The archive wrapped its content in one top-level directory.
    pub unwrapped: bool,
    /// Top-level names written into the installation root.
    pub applied: Vec<PathBuf>,
}

/// An archive unpacked into a scratch directory, waiting to be overlaid.
///
/// Dropping it removes the scratch directory.
pub struct ExtractedPayload {
    scratch: Workspace,
    root: PathBuf,
    entry_count: usize,
}

impl ExtractedPayload {
    /// Directory whose children are overlaid onto the installation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// The archive wrapped its content in one top-level directory.
    pub fn is_unwrapped(&self) -> bool {
        self.root != self.scratch.path()
    }

    /// Remove the scratch directory now; a failure is only logged.
    pub fn close(self) {
        if let Err(e) = self.scratch.close() {
            tracing::warn!(error = %e, "failed to remove extraction directory");
        }
    }
}

/// Extracts an update archive and overlays it onto the installation root.
#[derive(Debug, Clone)]
pub struct UpdateApplier {
    root: PathBuf,
    scratch_parent: PathBuf,
    reserved: Vec<OsString>,
    backup: BackupManager,
}

impl UpdateApplier {
    pub fn new(layout: &InstallLayout) -> Self {
        Self {
            root: layout.root().to_path_buf(),
            scratch_parent: layout.cache_dir(),
            reserved: layout.reserved_names().iter().map(OsString::from).collect(),
            backup: BackupManager::new(layout),
        }
    }

    /// [`extract`](Self::extract) then [`overlay`](Self::overlay). The
    /// scratch directory is removed on every path out of this function.
    pub fn apply(
        &self,
        archive: &Path,
        journal: &mut ApplyJournal,
        snapshot: &mut BackupSnapshot,
    ) -> Result<ApplyReport> {
        let payload = self.extract(archive)?;
        let report = self.overlay(&payload, journal, snapshot);
        payload.close();
        report
    }

    /// Unpack `archive` into a scratch directory beside the installation and
    /// locate the payload root. Touches nothing in the installation.
    pub fn extract(&self, archive: &Path) -> Result<ExtractedPayload> {
        let scratch = Workspace::new_in(&self.scratch_parent, "extract-")?;
        let extracted = extract_zip(archive, scratch.path())?;
        let root = payload_root(scratch.path())?;
        tracing::debug!(
            archive = %archive.display(),
            entries = extracted.entry_count,
            bytes = extracted.total_bytes,
            "archive extracted"
        );
        Ok(ExtractedPayload {
            scratch,
            root,
            entry_count: extracted.entry_count,
        })
    }

    /// Overlay every payload child onto the installation root, recording each
    /// in `journal` before it is touched.
    ///
    /// Files overwrite, directories are replaced wholesale. An existing entry
    /// the snapshot does not cover is copied into it first, so a rollback can
    /// always put it back.
    pub fn overlay(
        &self,
        payload: &ExtractedPayload,
        journal: &mut ApplyJournal,
        snapshot: &mut BackupSnapshot,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport {
            extracted_entries: payload.entry_count(),
            unwrapped: payload.is_unwrapped(),
            applied: Vec::new(),
        };

        for name in sorted_children(payload.root())? {
            if self.reserved.contains(&name) {
                tracing::warn!(entry = ?name, "skipping reserved name in update payload");
                continue;
            }
            let dest = self.root.join(&name);
            let existed = entry_kind(&dest)? != EntryKind::Missing;
            if existed {
                self.backup.preserve(snapshot, Path::new(&name))?;
            }
            journal.record(&name, existed);

            overlay_entry(payload.root().join(&name), &dest)
                .map_err(|source| Error::Apply { path: dest, source })?;
            report.applied.push(PathBuf::from(name));
        }

        tracing::info!(
            entries = report.extracted_entries,
            applied = report.applied.len(),
            unwrapped = report.unwrapped,
            "update payload applied"
        );
        Ok(report)
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<OsString>> {
    let read_err = |source| {
        Error::Fs(uplift_fs::Error::Read {
            path: dir.to_path_buf(),
            source,
        })
    };
    let mut names = std::fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(read_err)?;
    names.sort();
    Ok(names)
}
