//! HTTP search client
//!
//! Fetches result pages from the configured search endpoint and feeds them to the
//! extraction functions.

use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use tracing::{Instrument, debug, debug_span, error, instrument, warn};
use url::Url;

use super::error::SearchError;
use super::extraction::{extract_content, extract_related_terms};
use super::proxy::RoundRobin;
use super::{ContentRecord, SearchProvider};
use crate::cache::ResultCache;
use crate::config::Settings;
use crate::retry::RetryPolicy;

/// Query parameter carrying the search term
const QUERY_PARAM: &str = "wd";

/// Search client for a Baidu-style result page
pub struct SearchClient {
    /// One client per configured proxy, or a single direct client
    clients: RoundRobin<ReqwestClient>,

    /// Search endpoint
    base_url: Url,

    /// Retry policy for transient failures
    retry: RetryPolicy,

    /// Politeness limiter shared by every request from this client
    limiter: Option<Arc<DefaultDirectRateLimiter>>,

    /// Optional on-disk cache of result pages
    cache: Option<Arc<ResultCache>>,
}

impl SearchClient {
    /// Create a client from settings. The cache is attached separately with
    /// [`SearchClient::with_cache`] since opening it touches the filesystem.
    pub fn from_settings(settings: &Settings) -> Result<Self, SearchError> {
        let base_url = Url::parse(&settings.search_url)?;

        let clients = if settings.proxy_list.is_empty() {
            vec![build_client(settings, None)?]
        } else {
            settings
                .proxy_list
                .iter()
                .map(|proxy| build_client(settings, Some(proxy)))
                .collect::<Result<Vec<_>, _>>()?
        };

        let limiter = Quota::with_period(settings.request_interval())
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Ok(Self {
            clients: RoundRobin::new(clients),
            base_url,
            retry: settings.retry_policy(),
            limiter,
            cache: None,
        })
    }

    /// Serve and store result pages through `cache`
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of rotating HTTP clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Build the result page URL for a term
    pub fn query_url(&self, term: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair(QUERY_PARAM, term);
        url
    }

    /// Fetch the raw result page for a term, consulting the cache first
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_page(&self, term: &str) -> Result<String, SearchError> {
        let url = self.query_url(term);

        if let Some(cache) = &self.cache {
            match cache.get(url.as_str()).await {
                Ok(Some(bytes)) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Ok(None) => {}
                Err(e) => warn!("Cache read failed for {}: {}", url, e),
            }
        }

        let body = self
            .retry
            .run_when(|| self.send(&url), SearchError::is_transient)
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(url.as_str(), body.as_bytes()).await {
                warn!("Cache write failed for {}: {}", url, e);
            }
        }

        Ok(body)
    }

    /// Execute one GET request
    async fn send(&self, url: &Url) -> Result<String, SearchError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let client = self
            .clients
            .next()
            .ok_or_else(|| SearchError::Other("No HTTP client configured".to_string()))?;

        debug!("Sending GET request to {}", url);
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!("Provider error: {} for {}", status, url);
            return Err(SearchError::Status {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

impl SearchProvider for SearchClient {
    async fn related_terms(&self, keyword: &str) -> Result<Vec<String>, SearchError> {
        let html = self.fetch_page(keyword).await?;
        extract_related_terms(&html)
    }

    async fn content(&self, term: &str) -> Result<Vec<ContentRecord>, SearchError> {
        let html = self.fetch_page(term).await?;
        extract_content(&html)
    }
}

fn build_client(settings: &Settings, proxy: Option<&String>) -> Result<ReqwestClient, SearchError> {
    let mut builder = ReqwestClient::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.timeout());

    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::extraction::fixtures::{page, related_table, result_slot};
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;
    use tempfile::tempdir;

    fn test_settings(server: &mockito::ServerGuard) -> Settings {
        Settings::builder()
            .search_url(format!("{}/s", server.url()))
            .request_interval(0.0)
            .delay(0.0)
            .max_retries(3)
            .build()
    }

    fn sample_page() -> String {
        page(&[
            result_slot(1, "示例标题", "这是关于示例的一段详细摘要内容。", "示例网", "https://example.com/a"),
            related_table(&["相关1", "相关2"]),
        ])
    }

    #[test]
    fn test_query_url_encodes_term() {
        let settings = Settings::builder().search_url("http://www.baidu.com/s").build();
        let client = SearchClient::from_settings(&settings).unwrap();
        let url = client.query_url("示例 词");
        assert_eq!(url.host_str(), Some("www.baidu.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("wd".to_string(), "示例 词".to_string())]);
    }

    #[test]
    fn test_one_client_per_proxy() {
        let settings = Settings::builder()
            .proxy_list(vec![
                "http://127.0.0.1:8001".to_string(),
                "http://127.0.0.1:8002".to_string(),
            ])
            .build();
        let client = SearchClient::from_settings(&settings).unwrap();
        assert_eq!(client.client_count(), 2);
    }

    #[test]
    fn test_invalid_search_url() {
        let settings = Settings::builder().search_url("not a url").build();
        assert!(matches!(
            SearchClient::from_settings(&settings),
            Err(SearchError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn test_related_terms_and_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .match_query(Matcher::UrlEncoded("wd".into(), "示例".into()))
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(sample_page())
            .expect(2)
            .create_async()
            .await;

        let client = SearchClient::from_settings(&test_settings(&server)).unwrap();

        let terms = client.related_terms("示例").await.unwrap();
        assert_eq!(terms, vec!["相关1", "相关2"]);

        let records = client.content("示例").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "示例标题");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = SearchClient::from_settings(&test_settings(&server)).unwrap();
        let result = client.related_terms("示例").await;

        assert!(matches!(
            result,
            Err(SearchError::Status { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = SearchClient::from_settings(&test_settings(&server)).unwrap();
        assert!(client.content("示例").await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cached_pages_skip_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/s")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(sample_page())
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let cache = Arc::new(ResultCache::open(dir.path()).await.unwrap());
        let client = SearchClient::from_settings(&test_settings(&server))
            .unwrap()
            .with_cache(cache);

        let first = client.content("示例").await.unwrap();
        let second = client.content("示例").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(client.related_terms("示例").await.unwrap().len(), 2);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_page_is_not_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/s")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html><body>no results</body></html>")
            .create_async()
            .await;

        let client = SearchClient::from_settings(&test_settings(&server)).unwrap();
        assert!(client.related_terms("示例").await.unwrap().is_empty());
        assert!(client.content("示例").await.unwrap().is_empty());
    }
}
