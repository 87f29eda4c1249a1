//! Backup, overlay and rollback of an application installation.
//!
//! The three operations are synchronous and must never run concurrently on
//! the same root; callers serialise them and move them off async contexts.
//!
//! - [`BackupManager`] snapshots the allow-listed paths into a sibling
//!   backup directory.
//! - [`UpdateApplier`] extracts an archive and overlays its payload,
//!   recording what it touches in an [`ApplyJournal`].
//! - [`RollbackController`] restores a snapshot and undoes journal entries
//!   the snapshot does not cover.

mod applier;
mod backup;
mod error;
mod journal;
mod layout;
mod rollback;

pub use applier::{ApplyReport, ExtractedPayload, UpdateApplier};
pub use backup::{BackupManager, BackupSnapshot};
pub use error::{Error, Result, RollbackFailure};
pub use journal::{ApplyJournal, JournalEntry};
pub use layout::{
    BACKUP_DIR, CACHE_DIR, CACHE_FILE, CONFIG_FILE, DEFAULT_BACKUP_ITEMS, InstallLayout, LOCK_FILE,
    MANUAL_DIR,
};
pub use rollback::{RollbackController, RollbackReport};
