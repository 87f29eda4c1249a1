//! Offline release cache and manual-update instructions.
//!
//! The cache file is written after every successful online check and read
//! only when the registry is unreachable; [`OfflineCache::load`] treats any
//! problem with it as "no cache".

mod cache;
mod error;
mod manual;

pub use cache::{CacheEntry, OfflineCache};
pub use error::{Error, Result};
pub use manual::{ManualUpdateInfo, build_manual_instructions, find_manual_archive};
