//! # Site Emitter Module
//!
//! This module writes the static output for each keyword: a small site of landing
//! page, detail pages, sitemap, robots.txt and RSS feed under a directory derived
//! from the keyword, plus the navigation artifacts shared by every keyword at the
//! output root.
//!
//! ## Key Components
//!
//! - `SiteEmitter`: Writes keyword sites and keeps the root artifacts current
//! - `KeywordSite`: Everything fetched for one keyword, ready to render
//! - `GeneratedSite`: Where a site was written and how many detail pages it has
//! - `KeywordMap`: The append-only keyword-to-directory mapping file
//!
//! ## Features
//!
//! - All scraped text is HTML-escaped before it is placed in markup
//! - Root artifacts are rewritten under a single lock shared by all workers
//! - The mapping file only ever grows, and never holds the same line twice

mod error;
mod nav;
mod templates;
mod xml;

pub use error::SiteError;
pub use nav::{KeywordMap, MappingEntry, NAV_LIMIT, Topic, render_nav_page};
pub use templates::{STYLESHEET, detail_page, landing_page};
pub use xml::{keyword_sitemap, robots_txt, root_sitemap, rss_feed, site_path};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::search::ContentRecord;
use crate::slug::{keyword_dir_name, slugify};

/// Mapping of keywords to their site directories, at the output root
pub const MAPPING_FILE: &str = "folder_keywords.txt";

/// Stylesheet directory inside a keyword site
pub const CSS_DIR: &str = "c";

/// Detail page directory inside a keyword site
pub const PAGES_DIR: &str = "p";

/// Reference from one page of a keyword site to a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub term: String,

    /// File name inside the pages directory, e.g. `xiangguan1.html`
    pub file: String,

    /// Short description used in feeds
    pub summary: String,
}

impl DetailLink {
    pub fn new(term: &str, summary: &str) -> Self {
        Self {
            term: term.to_string(),
            file: format!("{}.html", slugify(term)),
            summary: summary.to_string(),
        }
    }

    /// Path relative to the keyword directory
    pub fn href(&self) -> String {
        format!("{}/{}", PAGES_DIR, self.file)
    }
}

/// Links for every page of a site, with file names made unique by a `-2`, `-3` suffix
fn detail_links(pages: &[TermPage]) -> Vec<DetailLink> {
    let mut used = HashSet::new();
    pages
        .iter()
        .map(|page| {
            let summary = page
                .records
                .first()
                .map(|record| record.abstract_text.chars().take(200).collect::<String>())
                .unwrap_or_default();
            let mut link = DetailLink::new(&page.term, &summary);

            let stem = slugify(&page.term);
            let mut n = 1;
            while !used.insert(link.file.clone()) {
                n += 1;
                link.file = format!("{}-{}.html", stem, n);
            }
            link
        })
        .collect()
}

/// Fetched content for one related term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPage {
    pub term: String,
    pub records: Vec<ContentRecord>,
}

/// Everything fetched for one keyword
#[derive(Debug, Clone, Default)]
pub struct KeywordSite {
    pub keyword: String,

    /// Related terms in provider order
    pub related_terms: Vec<String>,

    /// Terms that produced content; only these get detail pages
    pub pages: Vec<TermPage>,
}

/// Result of emitting one keyword site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSite {
    pub output_dir: PathBuf,
    pub detail_pages: usize,
}

/// Writes keyword sites and the shared navigation root
#[derive(Debug)]
pub struct SiteEmitter {
    root: PathBuf,
    site_url: String,

    /// Serializes every write to the root-level artifacts
    root_lock: Mutex<()>,
}

impl SiteEmitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            site_url: ".".to_string(),
            root_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.output_dir).with_site_url(settings.site_url.clone())
    }

    /// Prefix for absolute links in sitemaps, feeds and robots files
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.root.join(MAPPING_FILE)
    }

    /// Write the site for one keyword and refresh the root artifacts
    #[instrument(skip(self, site), fields(keyword = %site.keyword))]
    pub async fn emit(&self, site: &KeywordSite) -> Result<GeneratedSite, SiteError> {
        if site.related_terms.is_empty() {
            return Err(SiteError::Empty(format!("no related terms for {}", site.keyword)));
        }

        let dir_name = keyword_dir_name(&site.keyword);
        let output_dir = self.root.join(&dir_name);
        let site_base = site_path(&self.site_url, &dir_name);
        let generated_at = Local::now();

        fs::create_dir_all(output_dir.join(CSS_DIR)).await?;
        fs::create_dir_all(output_dir.join(PAGES_DIR)).await?;
        fs::write(output_dir.join(CSS_DIR).join("style.css"), STYLESHEET).await?;

        let links = detail_links(&site.pages);

        for (page, link) in site.pages.iter().zip(&links) {
            let html = detail_page(&site.keyword, page, &links, generated_at);
            fs::write(output_dir.join(PAGES_DIR).join(&link.file), html).await?;
            debug!("Wrote detail page {} for {}", link.file, page.term);
        }

        fs::write(
            output_dir.join("index.html"),
            landing_page(&site.keyword, &site.related_terms, &links, generated_at),
        )
        .await?;
        fs::write(
            output_dir.join("sitemap.xml"),
            keyword_sitemap(&site_base, &links, generated_at)?,
        )
        .await?;
        fs::write(output_dir.join("robots.txt"), robots_txt(&site_base)).await?;
        fs::write(
            output_dir.join("feed.xml"),
            rss_feed(&site.keyword, &site_base, &links, generated_at)?,
        )
        .await?;

        self.update_root(&site.keyword, &dir_name, generated_at).await?;

        info!(
            "Generated site for {} in {} ({} detail pages)",
            site.keyword,
            output_dir.display(),
            links.len()
        );

        Ok(GeneratedSite {
            output_dir,
            detail_pages: links.len(),
        })
    }

    /// Record the mapping and rewrite the navigation page, root sitemap and robots file
    async fn update_root(
        &self,
        keyword: &str,
        dir_name: &str,
        generated_at: DateTime<Local>,
    ) -> Result<(), SiteError> {
        let _guard = self.root_lock.lock().await;

        fs::create_dir_all(&self.root).await?;
        let mapping_path = self.mapping_path();
        let mut map = KeywordMap::load(&mapping_path).await?;
        if map.record(&mapping_path, keyword, dir_name).await? {
            debug!("Mapped {} to {}", keyword, dir_name);
        }

        let shown = map.display(keyword, NAV_LIMIT);
        fs::write(self.root.join("index.html"), render_nav_page(&shown, generated_at)).await?;

        let latest = map.latest();
        let mut dirs: Vec<&str> = Vec::with_capacity(latest.len());
        for entry in &latest {
            if !dirs.contains(&entry.dir.as_str()) {
                dirs.push(entry.dir.as_str());
            }
        }
        fs::write(
            self.root.join("sitemap.xml"),
            root_sitemap(&self.site_url, &dirs, generated_at)?,
        )
        .await?;
        fs::write(self.root.join("robots.txt"), robots_txt(&self.site_url)).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(title: &str) -> ContentRecord {
        ContentRecord {
            title: title.to_string(),
            abstract_text: "这是一段足够长的摘要内容文本。".to_string(),
            source: "示例网".to_string(),
            url: None,
        }
    }

    fn sample_site(keyword: &str) -> KeywordSite {
        KeywordSite {
            keyword: keyword.to_string(),
            related_terms: vec!["相关1".to_string(), "相关2".to_string()],
            pages: vec![
                TermPage {
                    term: "相关1".to_string(),
                    records: vec![record("相关标题一")],
                },
                TermPage {
                    term: "相关2".to_string(),
                    records: vec![record("相关标题二")],
                },
            ],
        }
    }

    #[test]
    fn test_detail_link_paths() {
        let link = DetailLink::new("相关1", "");
        assert_eq!(link.file, "xiangguan1.html");
        assert_eq!(link.href(), "p/xiangguan1.html");
    }

    #[tokio::test]
    async fn test_emit_writes_keyword_site() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());

        let generated = emitter.emit(&sample_site("示例")).await.unwrap();
        let site_dir = dir.path().join("s_shili");
        assert_eq!(generated.output_dir, site_dir);
        assert_eq!(generated.detail_pages, 2);

        for file in [
            "index.html",
            "c/style.css",
            "p/xiangguan1.html",
            "p/xiangguan2.html",
            "sitemap.xml",
            "robots.txt",
            "feed.xml",
        ] {
            assert!(site_dir.join(file).exists(), "missing {}", file);
        }

        let landing = fs::read_to_string(site_dir.join("index.html")).await.unwrap();
        assert!(landing.contains("p/xiangguan1.html"));
        assert!(landing.contains("p/xiangguan2.html"));

        let mapping = fs::read_to_string(dir.path().join(MAPPING_FILE)).await.unwrap();
        assert_eq!(mapping, "示例\ts_shili\n");
        assert!(dir.path().join("index.html").exists());
        assert!(dir.path().join("sitemap.xml").exists());
        assert!(dir.path().join("robots.txt").exists());
    }

    #[tokio::test]
    async fn test_colliding_term_slugs_get_distinct_pages() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let terms = ["电影下载网站推荐", "电影下载网站大全"];
        assert_eq!(slugify(terms[0]), slugify(terms[1]));

        let site = KeywordSite {
            keyword: "电影下载".to_string(),
            related_terms: terms.iter().map(|t| t.to_string()).collect(),
            pages: terms
                .iter()
                .map(|t| TermPage {
                    term: t.to_string(),
                    records: vec![record("相关标题")],
                })
                .collect(),
        };

        let generated = emitter.emit(&site).await.unwrap();
        assert_eq!(generated.detail_pages, 2);

        let stem = slugify(terms[0]);
        let pages_dir = generated.output_dir.join(PAGES_DIR);
        assert!(pages_dir.join(format!("{}.html", stem)).exists());
        assert!(pages_dir.join(format!("{}-2.html", stem)).exists());
        assert_eq!(std::fs::read_dir(&pages_dir).unwrap().count(), 2);

        let landing = fs::read_to_string(generated.output_dir.join("index.html"))
            .await
            .unwrap();
        assert!(landing.contains(&format!("p/{}-2.html", stem)));
    }

    #[tokio::test]
    async fn test_emit_twice_keeps_single_mapping() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());

        emitter.emit(&sample_site("示例")).await.unwrap();
        emitter.emit(&sample_site("示例")).await.unwrap();

        let mapping = fs::read_to_string(emitter.mapping_path()).await.unwrap();
        assert_eq!(mapping.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_terms_without_content_are_listed_but_not_linked() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let mut site = sample_site("示例");
        site.pages.truncate(1);

        let generated = emitter.emit(&site).await.unwrap();
        assert_eq!(generated.detail_pages, 1);

        let landing = fs::read_to_string(generated.output_dir.join("index.html"))
            .await
            .unwrap();
        assert!(landing.contains("<h2>相关2</h2>"));
        assert!(!generated.output_dir.join("p/xiangguan2.html").exists());
    }

    #[tokio::test]
    async fn test_empty_related_terms_rejected() {
        let dir = tempdir().unwrap();
        let emitter = SiteEmitter::new(dir.path());
        let site = KeywordSite {
            keyword: "示例".to_string(),
            ..Default::default()
        };

        assert!(matches!(emitter.emit(&site).await, Err(SiteError::Empty(_))));
        assert!(!dir.path().join("s_shili").exists());
    }

    #[tokio::test]
    async fn test_concurrent_emits_share_root() {
        let dir = tempdir().unwrap();
        let emitter = Arc::new(SiteEmitter::new(dir.path()));

        let keywords = ["电影", "游戏", "示例", "手机app"];
        let handles: Vec<_> = keywords
            .into_iter()
            .map(|keyword| {
                let emitter = emitter.clone();
                tokio::spawn(async move { emitter.emit(&sample_site(keyword)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let map = KeywordMap::load(&emitter.mapping_path()).await.unwrap();
        assert_eq!(map.entries().len(), 4);

        let nav = fs::read_to_string(dir.path().join("index.html")).await.unwrap();
        for keyword in keywords {
            assert!(nav.contains(&format!("{}/index.html", keyword_dir_name(keyword))));
        }

        let sitemap = fs::read_to_string(dir.path().join("sitemap.xml")).await.unwrap();
        assert_eq!(sitemap.matches("<url>").count(), 5);
    }
}
