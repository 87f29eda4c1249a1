//! Filesystem primitives for snapshotting and overlaying an installation.
//!
//! # Architecture
//!
//! - [`primitives`] - copy, overlay, remove and atomic write operations
//! - [`Workspace`] - scratch directory removed on drop
//! - [`InstallLock`] - exclusive advisory lock guarding one install root
//!
//! Every error carries the path it failed on. Nothing here logs; callers
//! decide which failures are best-effort.

mod error;
mod lock;
pub mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use lock::InstallLock;
pub use primitives::{
    AtomicWriteOptions, EntryKind, atomic_read, atomic_write, copy_dir_all, entry_kind,
    overlay_entry, remove_entry,
};
pub use workspace::Workspace;
