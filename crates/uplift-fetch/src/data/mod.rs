//! Immutable configuration and progress types.

mod options;
mod progress;

pub use options::{CHUNK_SIZE, FetchOptions, FetchPhase};
pub use progress::Progress;
