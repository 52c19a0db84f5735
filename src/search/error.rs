//! Error types for the search module

use crate::cache::CacheError;
use crate::error::Error as CrateError;
use reqwest::StatusCode;
use thiserror::Error;

/// Error type for search provider operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned {status} for {url}")]
    Status {
        /// HTTP status code
        status: StatusCode,
        /// Requested URL
        url: String,
    },

    /// Invalid CSS selector
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(e) => !e.is_builder(),
            SearchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Http(e) => CrateError::Http(e),
            _ => CrateError::Search(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> SearchError {
        SearchError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            url: "http://example.com/s".to_string(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(403).is_transient());
        assert!(!SearchError::HtmlParse("bad".to_string()).is_transient());
    }
}
