use uplift_source::ReleaseInfo;
use uplift_state::ManualUpdateInfo;

use crate::error::UpdateError;

/// Result of [`UpdateEngine::check_for_updates`](crate::UpdateEngine::check_for_updates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No newer release is known, online or cached.
    UpToDate { current: String },
    UpdateAvailable(AvailableUpdate),
}

impl CheckOutcome {
    pub fn available(&self) -> Option<&AvailableUpdate> {
        match self {
            CheckOutcome::UpdateAvailable(update) => Some(update),
            CheckOutcome::UpToDate { .. } => None,
        }
    }
}

/// A newer release and how it can be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub release: ReleaseInfo,
    pub mode: UpdateMode,
}

impl AvailableUpdate {
    pub fn version(&self) -> &str {
        &self.release.version
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.mode, UpdateMode::Manual(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateMode {
    /// Found online; the archive is downloaded during apply.
    Live,
    /// Known only from the offline cache; the user has to supply the archive.
    Manual(ManualUpdateInfo),
}

/// Terminal result of one apply.
#[derive(Debug)]
pub enum UpdateOutcome {
    Succeeded { version: String },
    /// The update failed after the backup and the installation was restored.
    RolledBack { version: String, error: UpdateError },
    /// The update failed before anything was changed.
    FailedBeforeMutation { error: UpdateError },
    /// Nothing could be downloaded; the user has to fetch the archive.
    ManualRequired(ManualUpdateInfo),
    /// The update failed and so did the restore. The backup directory is
    /// left in place for manual recovery.
    RollbackFailed {
        error: UpdateError,
        rollback_error: UpdateError,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Succeeded { .. })
    }

    /// The installation may be in a partially updated state.
    pub fn needs_intervention(&self) -> bool {
        matches!(self, UpdateOutcome::RollbackFailed { .. })
    }
}
