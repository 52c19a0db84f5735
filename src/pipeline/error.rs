//! Error types for the pipeline module

use crate::error::Error as CrateError;
use crate::search::SearchError;
use crate::site::SiteError;
use thiserror::Error;

/// Error type for one keyword's pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Related-term or content fetch failed
    #[error("{0}")]
    Search(#[from] SearchError),

    /// Writing the keyword site failed
    #[error("{0}")]
    Site(#[from] SiteError),

    /// The provider returned no related terms for the keyword
    #[error("no related terms")]
    NoRelatedTerms,

    /// The keyword's task panicked
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The keyword's task could not be joined
    #[error("task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

impl From<PipelineError> for CrateError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Search(e) => e.into(),
            PipelineError::Site(e) => e.into(),
            other => CrateError::Pipeline(other.to_string()),
        }
    }
}
