//! Release tag normalisation and newer-than decisions.
//!
//! Tags like `v1.2.0` are normalised to `1.2.0` before comparison. Two
//! strings that both parse as semantic versions are ordered by SemVer
//! precedence; anything else falls back to plain inequality.

pub use self::compare::{Comparison, compare, is_newer, normalize_tag};
pub use self::version::{SemVer, VersionError};

mod compare;
mod version;
