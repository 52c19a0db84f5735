//! Sitemap, RSS feed and robots.txt generation

use chrono::{DateTime, Local};
use quick_xml::se::to_string;
use serde::Serialize;

use super::DetailLink;
use super::error::SiteError;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// `<urlset>` document
#[derive(Debug, Serialize)]
#[serde(rename = "urlset")]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    url: Vec<SitemapUrl>,
}

/// One `<url>` entry
#[derive(Debug, Serialize)]
struct SitemapUrl {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename = "rss")]
struct Rss {
    #[serde(rename = "@version")]
    version: &'static str,
    channel: Channel,
}

#[derive(Debug, Serialize)]
struct Channel {
    title: String,
    link: String,
    description: String,
    language: &'static str,
    #[serde(rename = "pubDate")]
    pub_date: String,
    item: Vec<RssItem>,
}

#[derive(Debug, Serialize)]
struct RssItem {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

/// Join a site prefix and a relative path
pub fn site_path(site_url: &str, path: &str) -> String {
    let base = site_url.trim_end_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn render(doc: &impl Serialize) -> Result<String, SiteError> {
    Ok(format!("{}\n{}\n", XML_DECLARATION, to_string(doc)?))
}

/// Sitemap for one keyword site: the landing page plus each detail page
pub fn keyword_sitemap(
    site_base: &str,
    pages: &[DetailLink],
    generated_at: DateTime<Local>,
) -> Result<String, SiteError> {
    let lastmod = generated_at.format("%Y-%m-%d").to_string();

    let mut url = vec![SitemapUrl {
        loc: site_path(site_base, "index.html"),
        lastmod: lastmod.clone(),
        changefreq: "daily",
        priority: "1.0",
    }];
    url.extend(pages.iter().map(|page| SitemapUrl {
        loc: site_path(site_base, &page.href()),
        lastmod: lastmod.clone(),
        changefreq: "daily",
        priority: "0.8",
    }));

    render(&UrlSet {
        xmlns: SITEMAP_NS,
        url,
    })
}

/// Sitemap for the navigation root: the nav page plus every keyword site
pub fn root_sitemap(
    site_url: &str,
    dirs: &[&str],
    generated_at: DateTime<Local>,
) -> Result<String, SiteError> {
    let lastmod = generated_at.to_rfc3339();

    let mut url = vec![SitemapUrl {
        loc: site_path(site_url, "index.html"),
        lastmod: lastmod.clone(),
        changefreq: "always",
        priority: "1.0",
    }];
    url.extend(dirs.iter().map(|dir| SitemapUrl {
        loc: site_path(site_url, &format!("{}/index.html", dir)),
        lastmod: lastmod.clone(),
        changefreq: "hourly",
        priority: "0.9",
    }));

    render(&UrlSet {
        xmlns: SITEMAP_NS,
        url,
    })
}

/// RSS 2.0 feed listing a keyword site's detail pages
pub fn rss_feed(
    keyword: &str,
    site_base: &str,
    pages: &[DetailLink],
    generated_at: DateTime<Local>,
) -> Result<String, SiteError> {
    let pub_date = generated_at.to_rfc2822();

    let item = pages
        .iter()
        .map(|page| RssItem {
            title: page.term.clone(),
            link: site_path(site_base, &page.href()),
            description: page.summary.clone(),
            pub_date: pub_date.clone(),
        })
        .collect();

    render(&Rss {
        version: "2.0",
        channel: Channel {
            title: format!("{} - 最新搜索结果", keyword),
            link: site_path(site_base, "index.html"),
            description: format!("关于{}的最新搜索结果更新", keyword),
            language: "zh-CN",
            pub_date,
            item,
        },
    })
}

/// robots.txt allowing all crawlers and pointing at the sitemap
pub fn robots_txt(site_base: &str) -> String {
    let mut robots = format!(
        "User-agent: *\nAllow: /\nSitemap: {}\nCrawl-delay: 1\n",
        site_path(site_base, "sitemap.xml")
    );
    for agent in ["Googlebot", "Baiduspider", "bingbot", "Sogou web spider", "Bytespider"] {
        robots.push_str(&format!("\nUser-agent: {}\nCrawl-delay: 0.5\nAllow: /\n", agent));
    }
    for agent in ["Googlebot-Image", "Baiduspider-image"] {
        robots.push_str(&format!("\nUser-agent: {}\nDisallow: /\n", agent));
    }
    robots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn links() -> Vec<DetailLink> {
        vec![
            DetailLink::new("相关1", "示例摘要"),
            DetailLink::new("R&D", "a < b"),
        ]
    }

    #[test]
    fn test_site_path() {
        assert_eq!(site_path(".", "index.html"), "./index.html");
        assert_eq!(site_path("https://example.com/", "/s_a/index.html"), "https://example.com/s_a/index.html");
        assert_eq!(site_path("", "index.html"), "index.html");
    }

    #[test]
    fn test_keyword_sitemap() {
        let xml = keyword_sitemap("./s_shili", &links(), fixed_time()).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>./s_shili/index.html</loc>"));
        assert!(xml.contains("<loc>./s_shili/p/xiangguan1.html</loc>"));
        assert!(xml.contains("<lastmod>2024-05-01</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), 3);
    }

    #[test]
    fn test_root_sitemap() {
        let xml = root_sitemap("https://example.com", &["s_a", "s_b"], fixed_time()).unwrap();
        assert!(xml.contains("<loc>https://example.com/index.html</loc>"));
        assert!(xml.contains("<loc>https://example.com/s_b/index.html</loc>"));
        assert!(xml.contains("<changefreq>hourly</changefreq>"));
    }

    #[test]
    fn test_rss_feed_escapes_text() {
        let xml = rss_feed("示例", ".", &links(), fixed_time()).unwrap();
        assert!(xml.contains(r#"<rss version="2.0">"#));
        assert!(xml.contains("<title>R&amp;D</title>"));
        assert!(xml.contains("<description>a &lt; b</description>"));
        assert_eq!(xml.matches("<item>").count(), 2);
    }

    #[test]
    fn test_robots() {
        let robots = robots_txt("./s_shili");
        assert!(robots.starts_with("User-agent: *\nAllow: /\nSitemap: ./s_shili/sitemap.xml"));
        assert!(robots.contains("User-agent: Baiduspider"));
        assert!(robots.contains("User-agent: Googlebot-Image\nDisallow: /"));
    }
}
