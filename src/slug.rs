//! Filesystem-safe slugs
//!
//! Chinese characters are transliterated to toneless pinyin, everything else that
//! is not an ASCII letter or digit is dropped, and the result is lowercased and cut
//! to a fixed length.

use pinyin::ToPinyin;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 15;

/// Slug used when nothing survives transliteration
pub const FALLBACK_SLUG: &str = "page";

/// Prefix for per-keyword site directories
pub const DIR_PREFIX: &str = "s_";

/// Build the slug for a term
pub fn slugify(text: &str) -> String {
    let mut transliterated = String::with_capacity(text.len() * 2);
    for (ch, py) in text.chars().zip(text.to_pinyin()) {
        match py {
            Some(py) => transliterated.push_str(py.plain()),
            None => transliterated.push(ch),
        }
    }

    let slug: String = transliterated
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_SLUG_LEN)
        .collect();

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Directory name for a keyword's site
pub fn keyword_dir_name(keyword: &str) -> String {
    format!("{}{}", DIR_PREFIX, slugify(keyword))
}
