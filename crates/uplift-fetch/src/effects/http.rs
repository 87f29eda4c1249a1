use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// URL of the last hop after redirects were followed.
    pub final_url: String,
    pub body: Bytes,
}

/// A response whose body is still on the wire.
pub struct StreamResponse<E> {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// `get` and `stream` follow redirects; `head` must not, so a probe can
/// tell a redirect apart from the page it points at.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures. HTTP error statuses are not errors.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a small body into memory.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<Response, Self::Error>> + Send;

    /// Open a streaming GET.
    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<StreamResponse<Self::Error>, Self::Error>> + Send;

    /// Send a HEAD request and return the status code.
    fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<u16, Self::Error>> + Send;
}

impl<T: HttpClient> HttpClient for Arc<T> {
    type Error = T::Error;

    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<Response, Self::Error>> + Send {
        (**self).get(url, headers)
    }

    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<StreamResponse<Self::Error>, Self::Error>> + Send
    {
        (**self).stream(url, headers)
    }

    fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<u16, Self::Error>> + Send {
        (**self).head(url, headers)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use futures_util::StreamExt;

    use crate::error::{FetchError, Result};

    /// Production HTTP client implementation using reqwest.
    ///
    /// Holds two connection pools: one following redirects for reads, one
    /// with redirects disabled for probes.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
        probe: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
            let probe = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
            Ok(Self { client, probe })
        }

        fn request(
            client: &reqwest::Client,
            method: reqwest::Method,
            url: &str,
            headers: &[(String, String)],
        ) -> reqwest::RequestBuilder {
            let mut request = client.request(method, url);
            for (key, value) in headers {
                request = request.header(key.as_str(), value.as_str());
            }
            request
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<Response, Self::Error> {
            let response = Self::request(&self.client, reqwest::Method::GET, url, headers)
                .send()
                .await?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.bytes().await?;
            Ok(Response {
                status,
                final_url,
                body,
            })
        }

        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<StreamResponse<Self::Error>, Self::Error> {
            let response = Self::request(&self.client, reqwest::Method::GET, url, headers)
                .send()
                .await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let body = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));
            Ok(StreamResponse {
                status,
                content_length,
                body: Box::pin(body),
            })
        }

        async fn head(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<u16, Self::Error> {
            let response = Self::request(&self.probe, reqwest::Method::HEAD, url, headers)
                .send()
                .await?;
            Ok(response.status().as_u16())
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
