//! Release metadata retrieval and download-target resolution.
//!
//! - [`ReleaseSource`] asks the registry for its latest release, trying the
//!   structured API then the human-facing page, in repeated passes.
//! - [`AssetResolver`] turns a release into a single [`DownloadTarget`].

mod endpoints;
mod error;
mod model;
mod resolver;
mod source;

pub use endpoints::{RegistryEndpoints, Repository, tag_from_release_url};
pub use error::{Result, SourceError};
pub use model::{AssetRef, DownloadTarget, ReleaseInfo};
pub use resolver::AssetResolver;
pub use source::{API_ACCEPT, CheckOptions, ReleaseSource};
