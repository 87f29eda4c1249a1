pub mod atomic_write;
pub mod copy_dir;
pub mod overlay;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use copy_dir::copy_dir_all;
pub use overlay::{EntryKind, entry_kind, overlay_entry, remove_entry};
