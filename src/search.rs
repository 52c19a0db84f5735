//! # Search Provider Module
//!
//! This module is the boundary to the search engine whose result pages feed the
//! generated sites. It defines the `SearchProvider` contract the pipeline consumes
//! and an HTTP implementation that scrapes a Baidu-style result page.
//!
//! ## Key Components
//!
//! - `ContentRecord`: A single extracted search result (title, abstract, source, url)
//! - `SearchProvider`: Trait for fetching related terms and result content
//! - `SearchClient`: HTTP implementation with retries, rate limiting, proxies and caching
//! - Extraction utilities that turn a result page into related terms and records
//!
//! ## Features
//!
//! - Transient failures (transport errors, 429, 5xx) are retried with backoff
//! - A shared rate limiter spaces requests across all concurrent tasks
//! - Round-robin proxy rotation
//! - Optional on-disk caching of result pages
//!
//! An empty result is never an error: a page without matching markup simply yields
//! no terms or records.

mod client;
mod error;
mod extraction;
mod proxy;

pub use client::SearchClient;
pub use error::SearchError;
pub use extraction::{
    MAX_RESULT_SLOTS, clean_text, contains_cjk, extract_content, extract_related_terms,
    is_valid_record,
};
pub use proxy::RoundRobin;

#[cfg(test)]
pub(crate) use extraction::fixtures;

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A single search result extracted from a provider page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Result title
    pub title: String,

    /// Result snippet
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Name of the publishing site, empty when unknown
    #[serde(default)]
    pub source: String,

    /// Link to the original document
    #[serde(default)]
    pub url: Option<String>,
}

/// Source of related terms and result content for the pipeline.
///
/// Both operations are idempotent reads.
pub trait SearchProvider: Send + Sync {
    /// Related searches suggested for `keyword`, possibly empty
    fn related_terms(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<String>, SearchError>> + Send;

    /// Result records for `term`, possibly empty, at most `MAX_RESULT_SLOTS`
    fn content(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Vec<ContentRecord>, SearchError>> + Send;
}
