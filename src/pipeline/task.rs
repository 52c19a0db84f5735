//! The fetch-and-emit pipeline for a single keyword

use tracing::{debug, info, instrument, warn};

use super::error::PipelineError;
use crate::search::SearchProvider;
use crate::site::{GeneratedSite, KeywordSite, SiteEmitter, TermPage};

/// Fetch related terms for `keyword`, fetch content for each of them and emit the site.
///
/// A content error for one related term only skips that term. The keyword fails
/// when there are no related terms, or when every related term's fetch errored.
#[instrument(skip(provider, emitter))]
pub async fn run_keyword<P: SearchProvider>(
    provider: &P,
    emitter: &SiteEmitter,
    keyword: &str,
) -> Result<GeneratedSite, PipelineError> {
    let related_terms = provider.related_terms(keyword).await?;
    if related_terms.is_empty() {
        return Err(PipelineError::NoRelatedTerms);
    }
    info!("Found {} related terms for {}", related_terms.len(), keyword);

    let mut pages = Vec::with_capacity(related_terms.len());
    let mut failures = 0;
    let mut last_error = None;

    for term in &related_terms {
        match provider.content(term).await {
            Ok(records) if records.is_empty() => debug!("No content for {}", term),
            Ok(records) => {
                debug!("Fetched {} records for {}", records.len(), term);
                pages.push(TermPage {
                    term: term.clone(),
                    records,
                });
            }
            Err(e) => {
                warn!("Skipping related term {}: {}", term, e);
                failures += 1;
                last_error = Some(e);
            }
        }
    }

    if failures == related_terms.len() {
        if let Some(e) = last_error {
            return Err(e.into());
        }
    }

    let site = KeywordSite {
        keyword: keyword.to_string(),
        related_terms,
        pages,
    };
    Ok(emitter.emit(&site).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::StubProvider;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generates_site_for_keyword() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default().with_related("示例", &["相关1", "相关2"]);

        let site = run_keyword(&provider, &emitter, "示例").await.unwrap();

        assert_eq!(site.output_dir, dir.path().join("s_shili"));
        assert_eq!(site.detail_pages, 2);
        assert!(site.output_dir.join("p/xiangguan1.html").exists());
        assert!(site.output_dir.join("p/xiangguan2.html").exists());
    }

    #[tokio::test]
    async fn test_failed_term_is_skipped() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default()
            .with_related("示例", &["相关1", "相关2"])
            .failing_term("相关2");

        let site = run_keyword(&provider, &emitter, "示例").await.unwrap();

        assert_eq!(site.detail_pages, 1);
        assert!(!site.output_dir.join("p/xiangguan2.html").exists());
    }

    #[tokio::test]
    async fn test_all_terms_failing_fails_keyword() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default()
            .with_related("示例", &["相关1", "相关2"])
            .failing_term("相关1")
            .failing_term("相关2");

        let err = run_keyword(&provider, &emitter, "示例").await.unwrap_err();

        assert_eq!(err.to_string(), "timed out fetching 相关2");
        assert!(!dir.path().join("s_shili").exists());
    }

    #[tokio::test]
    async fn test_terms_without_content_still_emit() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default()
            .with_related("示例", &["相关1"])
            .empty_term("相关1");

        let site = run_keyword(&provider, &emitter, "示例").await.unwrap();

        assert_eq!(site.detail_pages, 0);
        assert!(site.output_dir.join("index.html").exists());
    }

    #[tokio::test]
    async fn test_no_related_terms() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default().with_related("示例", &[]);

        let err = run_keyword(&provider, &emitter, "示例").await.unwrap_err();

        assert!(matches!(err, PipelineError::NoRelatedTerms));
        assert_eq!(err.to_string(), "no related terms");
    }

    #[tokio::test]
    async fn test_related_term_error_propagates() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let provider = StubProvider::default().failing_keyword("示例");

        let err = run_keyword(&provider, &emitter, "示例").await.unwrap_err();
        assert!(matches!(err, PipelineError::Search(_)));
    }
}
