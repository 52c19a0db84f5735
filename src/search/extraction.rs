//! Result page extraction
//!
//! Selectors follow the layout of Baidu's result page: related searches live in a
//! table under `#rs_new`, and organic results are containers with numeric ids
//! `1..=11` carrying the target link in their `mu` attribute.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::ContentRecord;
use super::error::SearchError;

/// Number of candidate result slots scanned per page
pub const MAX_RESULT_SLOTS: usize = 11;

const RELATED_TERMS_SELECTOR: &str = "#rs_new > div > table";

const MIN_TITLE_CHARS: usize = 2;
const MIN_ABSTRACT_CHARS: usize = 10;

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[\x00-\x1f\x7f-\x9f]--\s]").expect("valid control character regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css)
        .map_err(|e| SearchError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

/// Strip non-whitespace control characters, then collapse whitespace runs
pub fn clean_text(text: &str) -> String {
    let visible = CONTROL_CHARS.replace_all(text, "");
    WHITESPACE.replace_all(&visible, " ").trim().to_string()
}

/// Whether `text` contains at least one CJK unified ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// Minimum-length checks applied to every extracted record
pub fn is_valid_record(record: &ContentRecord) -> bool {
    record.title.chars().count() >= MIN_TITLE_CHARS
        && record.abstract_text.chars().count() >= MIN_ABSTRACT_CHARS
}

/// Extract the related-search suggestions from a result page
pub fn extract_related_terms(html: &str) -> Result<Vec<String>, SearchError> {
    let document = Html::parse_document(html);
    let table = selector(RELATED_TERMS_SELECTOR)?;

    let mut seen = HashSet::new();
    let terms = document
        .select(&table)
        .flat_map(|element| element.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .filter(|text| seen.insert(text.clone()))
        .collect();

    Ok(terms)
}

/// Extract up to `MAX_RESULT_SLOTS` valid result records from a result page
pub fn extract_content(html: &str) -> Result<Vec<ContentRecord>, SearchError> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for slot in 1..=MAX_RESULT_SLOTS {
        match extract_slot(&document, slot)? {
            Some(record) => records.push(record),
            None => debug!("Result slot {} has no usable content", slot),
        }
    }

    Ok(records)
}

fn extract_slot(document: &Html, slot: usize) -> Result<Option<ContentRecord>, SearchError> {
    let root = format!(r#"[id="{}"]"#, slot);
    let body = format!("{root} > div > div:nth-of-type(1)");
    let snippet = format!("{body} > div:nth-of-type(2) > div:nth-of-type(1) > div:nth-of-type(2)");

    let Some(container) = document.select(&selector(&root)?).next() else {
        return Ok(None);
    };

    let title = clean_text(&joined_text(document, &selector(&format!("{body} > h3 > a"))?));
    if title.is_empty() || !contains_cjk(&title) {
        return Ok(None);
    }

    let abstract_text = clean_text(&joined_text(document, &selector(&snippet)?));
    if abstract_text.is_empty() {
        return Ok(None);
    }

    let source = document
        .select(&selector(&format!("{snippet} > div > a > span"))?)
        .flat_map(|element| element.text())
        .next()
        .map(clean_text)
        .unwrap_or_default();

    let url = container
        .value()
        .attr("mu")
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    let record = ContentRecord {
        title,
        abstract_text,
        source,
        url,
    };
    Ok(is_valid_record(&record).then_some(record))
}

fn joined_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .flat_map(|element: ElementRef<'_>| element.text())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\n\tb \u{0007}c  "), "a b c");
        assert_eq!(clean_text("\u{0085}"), "");
        assert_eq!(clean_text("a \u{7} b"), "a b");
        assert_eq!(clean_text("标题\u{1b} \n 内容"), "标题 内容");
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("Rust 教程"));
        assert!(!contains_cjk("Rust tutorial"));
    }

    #[test]
    fn test_related_terms() {
        let html = page(&[related_table(&["相关1", " 相关2 ", "相关1", ""])]);
        let terms = extract_related_terms(&html).unwrap();
        assert_eq!(terms, vec!["相关1", "相关2"]);
    }

    #[test]
    fn test_related_terms_missing_section() {
        let html = page(&["<div id=\"content\">nothing</div>".to_string()]);
        assert!(extract_related_terms(&html).unwrap().is_empty());
    }

    #[test]
    fn test_extract_content() {
        let html = page(&[
            result_slot(1, "示例标题", "这是关于示例的一段详细摘要内容。", "示例网", "https://example.com/a"),
            // title without CJK characters is filtered
            result_slot(2, "English only", "这是另一段足够长的摘要内容。", "", ""),
            // abstract below the minimum length
            result_slot(3, "短摘要", "太短", "", ""),
            result_slot(5, "第二条 结果", "第二条结果的摘要,\n 同样足够长。", "", ""),
        ]);

        let records = extract_content(&html).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "示例标题");
        assert!(first.abstract_text.starts_with("这是关于示例的一段详细摘要内容。"));
        assert_eq!(first.source, "示例网");
        assert_eq!(first.url.as_deref(), Some("https://example.com/a"));

        let second = &records[1];
        assert_eq!(second.title, "第二条 结果");
        assert!(second.abstract_text.contains("第二条结果的摘要, 同样足够长。"));
        assert_eq!(second.source, "");
        assert_eq!(second.url, None);
    }

    #[test]
    fn test_slots_beyond_limit_ignored() {
        let slots: Vec<String> = (1..=13)
            .map(|id| result_slot(id, "标题内容", "这是一段足够长的摘要内容文本。", "", ""))
            .collect();
        let records = extract_content(&page(&slots)).unwrap();
        assert_eq!(records.len(), MAX_RESULT_SLOTS);
    }
}
