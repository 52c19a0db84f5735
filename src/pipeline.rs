//! # Keyword Pipeline Module
//!
//! This module runs the fetch-and-emit pipeline for every keyword: related terms are
//! fetched for the keyword, content is fetched for each related term, and the result
//! is written out as a keyword site.
//!
//! ## Key Components
//!
//! - `run_keyword`: The pipeline for a single keyword
//! - `Coordinator`: Bounded fan-out across keywords with failure isolation
//! - `TaskResult`: Outcome recorded for every submitted keyword
//!
//! ## Features
//!
//! - At most `max_workers` keywords in flight
//! - Errors and panics inside one keyword never reach its siblings
//! - Soft memory-pressure warning before each keyword is admitted
//! - Optional progress channel reporting each finished keyword

mod coordinator;
mod error;
mod task;

pub use coordinator::{Coordinator, ExecutionMode};
pub use error::PipelineError;
pub use task::run_keyword;

use std::fmt;
use std::path::PathBuf;

use crate::site::GeneratedSite;

/// What happened to one keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Generated {
        output_dir: PathBuf,
        detail_pages: usize,
    },
    Failed {
        reason: String,
    },
}

/// Outcome of one keyword's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub keyword: String,
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn generated(keyword: impl Into<String>, site: GeneratedSite) -> Self {
        Self {
            keyword: keyword.into(),
            outcome: TaskOutcome::Generated {
                output_dir: site.output_dir,
                detail_pages: site.detail_pages,
            },
        }
    }

    pub fn failed(keyword: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            outcome: TaskOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Generated { .. })
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            TaskOutcome::Generated {
                output_dir,
                detail_pages,
            } => write!(
                f,
                "[ok] {} -> {} ({} pages)",
                self.keyword,
                output_dir.display(),
                detail_pages
            ),
            TaskOutcome::Failed { reason } => write!(f, "[failed] {}: {}", self.keyword, reason),
        }
    }
}
