use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image uri: {0:?}")]
    InvalidUri(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {status} for {uri}")]
    Status {
        uri: String,
        status: reqwest::StatusCode,
    },
    #[error("fetch failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parsing error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog is neither an array nor an object with a `foods` array")]
    NotAnArray,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parsing error: {0}")]
    Parse(#[from] serde_json::Error),
}
