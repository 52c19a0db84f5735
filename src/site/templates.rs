//! HTML and CSS templates for keyword sites
//!
//! Every piece of scraped or user-supplied text goes through `text` or `attr`
//! before it is placed in markup.

use std::borrow::Cow;

use chrono::{DateTime, Local};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::json;

use super::{DetailLink, TermPage};

/// Shared stylesheet written to `c/style.css`
pub const STYLESHEET: &str = r#":root {
    --primary: #1a0dab;
    --text: #202124;
    --muted: #4d5156;
    --border: #e0e0e0;
    --bg: #f8f9fa;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Noto Sans SC", sans-serif;
    line-height: 1.6;
    margin: 0;
    background: var(--bg);
    color: var(--text);
}

.container {
    max-width: 960px;
    margin: 0 auto;
    padding: 24px 16px;
}

.breadcrumb {
    color: #666;
    font-size: 14px;
    margin-bottom: 20px;
}

h1 {
    font-size: 24px;
    color: var(--primary);
    border-bottom: 2px solid var(--border);
    padding-bottom: 10px;
}

.result-item,
.search-result,
.related-searches {
    background: #fff;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    margin-bottom: 20px;
    padding: 20px;
}

.result-item h2,
.search-result h2 {
    font-size: 18px;
    margin: 0 0 10px 0;
}

a {
    color: var(--primary);
    text-decoration: none;
}

a:hover {
    text-decoration: underline;
}

.abstract {
    color: var(--muted);
    text-indent: 2em;
}

.meta-info,
.source-link,
.article-meta {
    color: #666;
    font-size: 14px;
}

.related-terms {
    display: flex;
    flex-wrap: wrap;
    gap: 10px;
}

.related-term {
    background: var(--bg);
    border-radius: 20px;
    font-size: 14px;
    padding: 8px 15px;
}

footer {
    color: #666;
    font-size: 13px;
    margin-top: 40px;
    text-align: center;
}
"#;

fn text(value: &str) -> Cow<'_, str> {
    encode_text(value)
}

fn attr(value: &str) -> Cow<'_, str> {
    encode_double_quoted_attribute(value)
}

/// Serialize structured data for a `<script type="application/ld+json">` block
fn json_ld(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Shared `<head>` markup
fn head(title: &str, description: &str, keywords: &str, stylesheet: &str, canonical: &str) -> String {
    format!(
        r#"<meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <meta name="keywords" content="{keywords}">
    <meta name="robots" content="index, follow">
    <meta property="og:title" content="{og_title}">
    <meta property="og:description" content="{description}">
    <meta property="og:type" content="website">
    <meta property="og:locale" content="zh_CN">
    <meta http-equiv="Cache-Control" content="no-transform">
    <meta name="applicable-device" content="pc,mobile">
    <link rel="stylesheet" href="{stylesheet}">
    <link rel="canonical" href="{canonical}">"#,
        title = text(title),
        og_title = attr(title),
        description = attr(description),
        keywords = attr(keywords),
        stylesheet = attr(stylesheet),
        canonical = attr(canonical),
    )
}

/// Landing page listing every related term of a keyword
pub fn landing_page(
    keyword: &str,
    related_terms: &[String],
    pages: &[DetailLink],
    generated_at: DateTime<Local>,
) -> String {
    let results: String = related_terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let heading = match pages.iter().find(|page| page.term == *term) {
                Some(page) => format!(
                    r#"<a href="{}" class="result-link">{}</a>"#,
                    attr(&page.href()),
                    text(term)
                ),
                None => text(term).into_owned(),
            };
            format!(
                r#"
        <article class="result-item" data-position="{}">
            <h2>{}</h2>
            <div class="result-snippet"><p>点击查看详细内容</p></div>
        </article>"#,
                i + 1,
                heading
            )
        })
        .collect();

    let structured = json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "name": format!("{}相关搜索", keyword),
        "numberOfItems": related_terms.len(),
        "itemListElement": related_terms.iter().enumerate().map(|(i, term)| json!({
            "@type": "ListItem",
            "position": i + 1,
            "name": term,
            "url": pages.iter().find(|page| page.term == *term).map(|page| page.href()),
        })).collect::<Vec<_>>(),
    });

    let mut keywords: Vec<&str> = vec![keyword];
    keywords.extend(related_terms.iter().map(String::as_str).filter(|t| *t != keyword));
    let description = format!("关于{}的相关搜索结果，含{}个相关主题。", keyword, related_terms.len());

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    {head}
    <script type="application/ld+json">{structured}</script>
</head>
<body>
    <div class="container">
        <nav class="breadcrumb"><a href="../index.html">首页</a> &gt; {keyword}</nav>
        <h1>{keyword} - 相关搜索</h1>
        <div class="article-meta">共{count}个结果 · 更新时间：{timestamp}</div>
        <main>{results}
        </main>
        <footer><p>更新时间：{timestamp}</p></footer>
    </div>
</body>
</html>
"#,
        head = head(
            &format!("{} - 相关搜索结果", keyword),
            &description,
            &keywords.join(", "),
            "c/style.css",
            "index.html"
        ),
        structured = json_ld(&structured),
        keyword = text(keyword),
        count = related_terms.len(),
        timestamp = generated_at.format("%Y-%m-%d %H:%M:%S"),
        results = results,
    )
}

/// Detail page for one related term
pub fn detail_page(
    keyword: &str,
    page: &TermPage,
    siblings: &[DetailLink],
    generated_at: DateTime<Local>,
) -> String {
    let published = generated_at.to_rfc3339();

    let articles: String = page
        .records
        .iter()
        .map(|record| {
            let link = match record.url.as_deref() {
                Some(url) => format!(
                    r#"<p class="source-link">原文链接：<a href="{}" target="_blank" rel="noopener noreferrer" itemprop="url">{}</a></p>"#,
                    attr(url),
                    text(url)
                ),
                None => String::new(),
            };
            format!(
                r#"
            <article class="search-result" itemscope itemtype="http://schema.org/Article">
                <h2 itemprop="headline">{title}</h2>
                <div class="content-body">
                    <p itemprop="description" class="abstract">{abstract_text}</p>
                    <div class="meta-info">
                        <span class="source">来源：{source}</span>
                        <time itemprop="datePublished" datetime="{published}">{date}</time>
                    </div>
                    {link}
                </div>
            </article>"#,
                title = text(&record.title),
                abstract_text = text(&record.abstract_text),
                source = text(&record.source),
                published = attr(&published),
                date = generated_at.format("%Y-%m-%d"),
                link = link,
            )
        })
        .collect();

    let internal_links: String = siblings
        .iter()
        .filter(|sibling| sibling.term != page.term)
        .map(|sibling| {
            format!(
                r#"<a href="{}" class="related-term">{}</a>"#,
                attr(&sibling.file),
                text(&sibling.term)
            )
        })
        .collect::<Vec<_>>()
        .join("\n                    ");

    let structured = json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "itemListElement": page.records.iter().enumerate().map(|(i, record)| json!({
            "@type": "Article",
            "position": i + 1,
            "headline": record.title,
            "description": record.abstract_text,
            "url": record.url,
            "publisher": { "@type": "Organization", "name": record.source },
            "datePublished": published,
            "inLanguage": "zh-CN",
            "articleSection": page.term,
        })).collect::<Vec<_>>(),
        "mainEntity": {
            "@type": "WebPage",
            "name": format!("{} - 相关内容详细信息", page.term),
            "isPartOf": { "@type": "WebSite", "name": keyword, "url": "../index.html" },
        },
    });

    let titles: Vec<&str> = page.records.iter().map(|r| r.title.as_str()).collect();
    let mut description = format!(
        "{}的详细内容。包含{}个相关结果：{}等。",
        page.term,
        page.records.len(),
        titles.iter().take(3).copied().collect::<Vec<_>>().join("，")
    );
    if let Some(first) = page.records.first() {
        description.extend(first.abstract_text.chars().take(100));
    }
    let mut keywords = vec![page.term.as_str()];
    keywords.extend(titles.iter().take(19));

    let canonical = siblings
        .iter()
        .find(|sibling| sibling.term == page.term)
        .map(|sibling| sibling.file.clone())
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    {head}
    <script type="application/ld+json">{structured}</script>
</head>
<body>
    <div class="container">
        <nav class="breadcrumb">
            <a href="../../index.html">首页</a> &gt; <a href="../index.html">{keyword}</a> &gt; {term}
        </nav>
        <article>
            <h1>{term}</h1>
            <div class="article-meta">发布时间：{timestamp}</div>
            <main>{articles}
            </main>
            <div class="related-searches">
                <h3>相关页面</h3>
                <div class="related-terms">
                    {internal_links}
                </div>
            </div>
            <footer><p><a href="../index.html">返回搜索结果</a></p></footer>
        </article>
    </div>
</body>
</html>
"#,
        head = head(
            &format!("{} - 相关内容详细信息 - 最新整理", page.term),
            &description,
            &keywords.join(", "),
            "../c/style.css",
            &canonical
        ),
        structured = json_ld(&structured),
        keyword = text(keyword),
        term = text(&page.term),
        timestamp = generated_at.format("%Y-%m-%d %H:%M:%S"),
        articles = articles,
        internal_links = internal_links,
    )
}
