//! # Settings Module
//!
//! This module provides the configuration object that is passed to every component
//! at construction time: worker limits, retry parameters, memory ceiling, cache and
//! proxy options, and the search endpoint. Settings are persisted as a JSON document.
//!
//! ## Key Components
//!
//! - `Settings`: The complete configuration with serde defaults for every field
//! - `SettingsBuilder`: Builder pattern implementation for programmatic configuration
//! - `ConfigError`: Errors raised while reading or writing the settings document
//!
//! ## Features
//!
//! - Missing settings file is created with defaults on first run
//! - Unknown fields are ignored, missing fields fall back to defaults
//! - Out-of-range values are clamped rather than rejected

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Error as CrateError;
use crate::retry::RetryPolicy;

/// Default User-Agent sent to the search provider
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Error type for settings operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => CrateError::Io(e),
            ConfigError::Json(e) => CrateError::Config(e.to_string()),
        }
    }
}

/// Runtime settings for the keyword pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of keywords processed concurrently
    pub max_workers: usize,

    /// Maximum attempts per network request
    pub max_retries: u32,

    /// Base retry delay in seconds
    pub delay: f64,

    /// Memory utilization ceiling in percent
    pub max_memory_percent: f64,

    /// Whether provider responses are cached on disk
    pub cache_enabled: bool,

    /// Proxy endpoints to rotate through
    pub proxy_list: Vec<String>,

    /// Directory for the response cache
    pub cache_dir: PathBuf,

    /// Root directory for generated sites
    pub output_dir: PathBuf,

    /// Search endpoint; the term is sent as the `wd` query parameter
    pub search_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Minimum spacing between provider requests in seconds
    pub request_interval: f64,

    /// Prefix for sitemap and robots.txt locations
    pub site_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_workers: 3,
            max_retries: 3,
            delay: 1.0,
            max_memory_percent: 75.0,
            cache_enabled: true,
            proxy_list: Vec::new(),
            cache_dir: PathBuf::from("cache"),
            output_dir: PathBuf::from("."),
            search_url: "http://www.baidu.com/s".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            request_interval: 2.0,
            site_url: ".".to_string(),
        }
    }
}

impl Settings {
    /// Create a new builder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Read settings from a JSON file
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&raw)?;
        Ok(settings.normalized())
    }

    /// Write settings to a JSON file, creating parent directories as needed
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Load settings, writing defaults out when the file does not exist.
    ///
    /// Never fails: unreadable or invalid documents fall back to defaults
    /// with a logged warning.
    pub async fn load_or_init(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match Self::read(path).await {
            Ok(settings) => settings,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                match settings.save(path).await {
                    Ok(()) => info!("Wrote default settings to {}", path.display()),
                    Err(e) => warn!("Failed to write default settings to {}: {}", path.display(), e),
                }
                settings
            }
            Err(e) => {
                warn!("Failed to load settings from {}, using defaults: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Clamp values into their valid ranges
    pub fn normalized(mut self) -> Self {
        self.max_workers = self.max_workers.max(1);
        self.max_retries = self.max_retries.max(1);
        self.max_memory_percent = if self.max_memory_percent.is_nan() {
            Self::default().max_memory_percent
        } else {
            self.max_memory_percent.clamp(0.0, 100.0)
        };
        self
    }

    /// Retry policy derived from `max_retries` and `delay`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, seconds(self.delay))
    }

    /// Spacing between provider requests
    pub fn request_interval(&self) -> Duration {
        seconds(self.request_interval)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// Builder for Settings
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Set the worker limit
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.settings.max_workers = max_workers;
        self
    }

    /// Set the maximum attempts per request
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.settings.max_retries = max_retries;
        self
    }

    /// Set the base retry delay in seconds
    pub fn delay(mut self, delay: f64) -> Self {
        self.settings.delay = delay;
        self
    }

    /// Set the memory ceiling in percent
    pub fn max_memory_percent(mut self, percent: f64) -> Self {
        self.settings.max_memory_percent = percent;
        self
    }

    /// Enable or disable the response cache
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.settings.cache_enabled = enabled;
        self
    }

    /// Set the proxies to rotate through
    pub fn proxy_list(mut self, proxies: Vec<String>) -> Self {
        self.settings.proxy_list = proxies;
        self
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.cache_dir = dir.into();
        self
    }

    /// Set the output root
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.output_dir = dir.into();
        self
    }

    /// Set the search endpoint
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.settings.search_url = url.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.settings.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.settings.timeout_secs = timeout_secs;
        self
    }

    /// Set the spacing between provider requests in seconds
    pub fn request_interval(mut self, interval: f64) -> Self {
        self.settings.request_interval = interval;
        self
    }

    /// Set the public site prefix
    pub fn site_url(mut self, site_url: impl Into<String>) -> Self {
        self.settings.site_url = site_url.into();
        self
    }

    /// Build the settings
    pub fn build(self) -> Settings {
        self.settings.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let settings = Settings::load_or_init(&path).await;
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        let reread = Settings::read(&path).await.unwrap();
        assert_eq!(reread, Settings::default());
    }

    #[tokio::test]
    async fn test_partial_document_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"max_workers": 8, "proxy_list": ["http://127.0.0.1:8080"], "extra": 1}"#)
            .await
            .unwrap();

        let settings = Settings::load_or_init(&path).await;
        assert_eq!(settings.max_workers, 8);
        assert_eq!(settings.proxy_list, vec!["http://127.0.0.1:8080".to_string()]);
        assert_eq!(settings.max_retries, 3);
        assert!(settings.cache_enabled);
    }

    #[tokio::test]
    async fn test_invalid_document_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "max_workers: [").await.unwrap();

        let settings = Settings::load_or_init(&path).await;
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_builder_clamps_values() {
        let settings = Settings::builder()
            .max_workers(0)
            .max_retries(0)
            .max_memory_percent(140.0)
            .delay(-2.0)
            .build();

        assert_eq!(settings.max_workers, 1);
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.max_memory_percent, 100.0);
        assert_eq!(settings.retry_policy().base_delay(), Duration::ZERO);
    }

    #[test]
    fn test_durations() {
        let settings = Settings::builder().delay(0.5).request_interval(2.0).build();
        assert_eq!(settings.retry_policy().base_delay(), Duration::from_millis(500));
        assert_eq!(settings.request_interval(), Duration::from_secs(2));
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }
}
