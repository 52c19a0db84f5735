//! Error types for the serpsite crate

use thiserror::Error;

/// Result type for serpsite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for serpsite operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Search provider error
    #[error("Search error: {0}")]
    Search(String),

    /// Result cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Site generation error
    #[error("Site error: {0}")]
    Site(String),

    /// Keyword pipeline error
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
