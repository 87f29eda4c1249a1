//! Update archive extraction with path sanitization and payload-root
//! detection.
//!
//! # Architecture
//!
//! - `format.rs` - Archive name detection
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - ZIP extraction into a directory
//! - `payload.rs` - Single-wrapper-directory normalisation

pub use error::{Error, Result};
pub use extract::{ExtractReport, extract_zip};
pub use format::{ARCHIVE_EXTENSION, is_archive_name};
pub use payload::payload_root;
pub use sanitize::sanitize_entry_path;

mod error;
mod extract;
mod format;
mod payload;
mod sanitize;
