//! I/O operations behind the [`HttpClient`] trait.

mod fetcher;
mod http;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, Response, StreamResponse};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
