use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("release registry unreachable after {passes} passes: {last}")]
    Network { passes: u32, last: String },

    #[error("no usable asset for release {version} (tried {} fallback URLs)", tried.len())]
    NoUsableAsset { version: String, tried: Vec<String> },
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Why one endpoint was skipped during a pass.
#[derive(Debug, Error)]
pub(crate) enum EndpointError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed release metadata: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no release tag in {0}")]
    NoTag(String),
}
