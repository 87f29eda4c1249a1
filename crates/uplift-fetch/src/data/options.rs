use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

/// Size of the pieces a download is written and reported in.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Phases of a download operation.
///
/// Connecting → Downloading → Committing → Completed. A retry returns to
/// Connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Waiting for response headers.
    #[default]
    Connecting,

    /// Streaming the body to the staging file.
    Downloading,

    /// Moving the staging file into place.
    Committing,

    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Configuration for a download.
///
/// # Examples
///
/// ```
/// use uplift_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(5)
///     .timeout(Duration::from_secs(30))
///     .header("Accept", "application/octet-stream");
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Total attempts, including the first.
    ///
    /// Default: 3
    pub max_attempts: u32,

    /// Base delay for exponential backoff. The wait after failed attempt
    /// `n` (0-indexed) is `retry_backoff * 2^n`; no wait follows the last
    /// attempt.
    ///
    /// Default: 1s
    pub retry_backoff: Duration,

    /// Applied to connecting and to each body read.
    ///
    /// Default: 60s
    pub timeout: Duration,

    /// Size advertised by the release, preferred over Content-Length.
    pub expected_size: Option<u64>,

    /// Headers sent with every attempt.
    pub headers: Arc<[(String, String)]>,

    /// Invoked on phase transitions and after every written chunk.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .field("timeout", &self.timeout)
            .field("expected_size", &self.expected_size)
            .field("headers", &self.headers)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            expected_size: None,
            headers: Arc::new([]),
            on_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn expected_size(mut self, expected_size: Option<u64>) -> Self {
        self.expected_size = expected_size;
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(callback);
        self
    }
}
