//! Error types for the chart pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, assembling or rendering the chart
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or fetch an asset
    #[error("Failed to load asset: {0}")]
    AssetError(String),

    /// Asset content could not be decoded
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// The renderer rejected the specification
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The designated chart container does not exist on the page
    #[error("Chart container not found: {0}")]
    ContainerNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::AssetError(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}
