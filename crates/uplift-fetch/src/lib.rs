//! HTTP client abstraction and retrying streamed downloads.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! Timeouts are applied by callers around each client future, so any
//! [`HttpClient`] implementation gets identical timeout behaviour.

mod core;
mod data;
mod effects;
mod error;

pub use self::core::{is_redirect, is_success, linear_delay, retry_delay};
pub use data::{CHUNK_SIZE, FetchOptions, FetchPhase, Progress};
pub use effects::{BoxStream, Fetcher, HttpClient, Response, StreamResponse};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};
