//! Keyword loading
//!
//! Keyword files are plain text, one keyword per line. They come from a mix of
//! editors, so decoding tries UTF-8 (with and without BOM) before falling back to
//! the GBK family of legacy Chinese encodings.

use std::collections::HashSet;
use std::path::Path;

use encoding_rs::{GB18030, GBK};
use tracing::{info, instrument, warn};

use crate::error::Result;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw keyword file bytes into text
pub fn decode_keyword_bytes(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return text.to_string();
    }

    if let Some(text) = GBK.decode_without_bom_handling_and_without_replacement(bytes) {
        return text.into_owned();
    }

    warn!("Keyword file is neither UTF-8 nor GBK, decoding lossily as GB18030");
    let (text, _had_errors) = GB18030.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Split text into keywords: trimmed, non-empty, first occurrence wins
pub fn parse_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(|line| line.replace(['\u{feff}', '\u{200b}'], ""))
        .map(|line| line.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.clone()))
        .collect()
}

/// Load the keyword list from a file
#[instrument]
pub async fn load_keywords(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    let keywords = parse_keywords(&decode_keyword_bytes(&bytes));

    if keywords.is_empty() {
        warn!("No keywords found in {}", path.as_ref().display());
    } else {
        info!("Loaded {} keywords", keywords.len());
    }
    Ok(keywords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dedup_preserves_order() {
        let keywords = parse_keywords("a\nb\na\n\nc\n");
        assert_eq!(keywords, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_strips_invisible_characters() {
        let keywords = parse_keywords("\u{feff}示例\r\n  示例\u{200b} \n\t\n其他");
        assert_eq!(keywords, vec!["示例", "其他"]);
    }

    #[test]
    fn test_decodes_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("关键词\n".as_bytes());
        assert_eq!(decode_keyword_bytes(&bytes), "关键词\n");
    }

    #[test]
    fn test_decodes_gbk() {
        let (encoded, _, _) = GBK.encode("电影下载\n游戏");
        assert!(std::str::from_utf8(&encoded).is_err());
        assert_eq!(decode_keyword_bytes(&encoded), "电影下载\n游戏");
    }

    #[tokio::test]
    async fn test_load_keywords_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1.txt");
        tokio::fs::write(&path, "a\nb\na\n\nc").await.unwrap();

        let keywords = load_keywords(&path).await.unwrap();
        assert_eq!(keywords, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(load_keywords(dir.path().join("missing.txt")).await.is_err());
    }
}
