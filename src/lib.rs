//! # serpsite - Keyword Site Generation from Search Result Pages
//!
//! This crate turns a list of keywords into static, SEO-oriented websites. For each
//! keyword it asks a search provider for related searches, fetches result snippets
//! for every related term, and writes a small site (landing page, detail pages,
//! sitemap, robots.txt, RSS feed) plus a shared navigation page.
//!
//! ## Features
//!
//! - Keyword loading with legacy encoding fallback and order-preserving dedup
//! - Pinyin-based slugs for directory and file names
//! - HTTP search client with retries, proxy rotation, politeness rate limiting
//!   and an optional on-disk response cache
//! - Bounded fan-out across keywords with per-keyword failure isolation
//! - Soft memory-pressure checks before admitting work
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serpsite::config::Settings;
//! use serpsite::pipeline::Coordinator;
//! use serpsite::search::SearchClient;
//! use serpsite::site::SiteEmitter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load_or_init("config.json").await;
//!     let keywords = serpsite::keywords::load_keywords("1.txt").await?;
//!
//!     let client = Arc::new(SearchClient::from_settings(&settings)?);
//!     let emitter = Arc::new(SiteEmitter::from_settings(&settings));
//!     let coordinator = Coordinator::new(client, emitter, &settings);
//!
//!     for result in coordinator.run(&keywords, None).await {
//!         println!("{}", result);
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub mod cache;
pub mod config;
pub mod keywords;
pub mod monitor;
pub mod pipeline;
pub mod retry;
pub mod search;
pub mod site;
pub mod slug;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::pipeline::{TaskOutcome, TaskResult};
    pub use crate::search::{ContentRecord, SearchProvider};
}
