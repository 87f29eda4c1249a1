//! Pure transformations used by the fetch and probe paths.

mod retry;
mod validation;

pub use retry::{linear_delay, retry_delay};
pub use validation::{is_redirect, is_success};
