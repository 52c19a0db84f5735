//! Error types for the site module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for site generation
#[derive(Debug, Error)]
pub enum SiteError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML serialization error
    #[error("XML serialization error: {0}")]
    Xml(#[from] quick_xml::errors::serialize::SeError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing to publish for the keyword
    #[error("Nothing to publish: {0}")]
    Empty(String),
}

impl From<SiteError> for CrateError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::Io(e) => CrateError::Io(e),
            SiteError::Json(e) => CrateError::Json(e),
            _ => CrateError::Site(err.to_string()),
        }
    }
}
