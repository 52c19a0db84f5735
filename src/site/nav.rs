//! Keyword-to-directory mapping and the root navigation page

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Local};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tokio::io::AsyncWriteExt;

use super::error::SiteError;

/// Number of keywords shown on the navigation page
pub const NAV_LIMIT: usize = 20;

/// Topic buckets for the navigation page, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Entertainment,
    GamesAnime,
    Tech,
    Other,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Entertainment, Topic::GamesAnime, Topic::Tech, Topic::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Topic::Entertainment => "影视娱乐",
            Topic::GamesAnime => "游戏动漫",
            Topic::Tech => "科技数码",
            Topic::Other => "其他",
        }
    }

    /// Classify a keyword by substring rules
    pub fn classify(keyword: &str) -> Self {
        let has = |needles: &[&str]| needles.iter().any(|n| keyword.contains(n));
        if has(&["电影", "视频", "观看"]) {
            Topic::Entertainment
        } else if has(&["游戏", "动漫"]) {
            Topic::GamesAnime
        } else if keyword.to_lowercase().contains("app") || has(&["下载"]) {
            Topic::Tech
        } else {
            Topic::Other
        }
    }
}

/// One keyword and the directory holding its site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub keyword: String,
    pub dir: String,
}

/// Contents of `folder_keywords.txt`: tab-separated, one mapping per line, append-only
#[derive(Debug, Default, Clone)]
pub struct KeywordMap {
    entries: Vec<MappingEntry>,
}

impl KeywordMap {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.trim_end_matches('\r').split_once('\t'))
            .map(|(keyword, dir)| MappingEntry {
                keyword: keyword.trim().to_string(),
                dir: dir.trim().to_string(),
            })
            .filter(|entry| !entry.keyword.is_empty() && !entry.dir.is_empty())
            .collect();
        Self { entries }
    }

    /// Read the mapping file; a missing file is an empty mapping
    pub async fn load(path: &Path) -> Result<Self, SiteError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn contains(&self, keyword: &str, dir: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.keyword == keyword && entry.dir == dir)
    }

    /// Record a mapping and append it to `path` unless it is already present.
    /// Returns whether a line was written.
    pub async fn record(&mut self, path: &Path, keyword: &str, dir: &str) -> Result<bool, SiteError> {
        let keyword = keyword.replace(['\t', '\n', '\r'], " ");
        if self.contains(&keyword, dir) {
            return Ok(false);
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(format!("{}\t{}\n", keyword, dir).as_bytes()).await?;
        file.flush().await?;

        self.entries.push(MappingEntry {
            keyword,
            dir: dir.to_string(),
        });
        Ok(true)
    }

    /// Latest directory per keyword, most recently recorded first
    pub fn latest(&self) -> Vec<&MappingEntry> {
        let mut latest: Vec<&MappingEntry> = Vec::new();
        for entry in self.entries.iter().rev() {
            if !latest.iter().any(|seen| seen.keyword == entry.keyword) {
                latest.push(entry);
            }
        }
        latest
    }

    /// Keywords for the navigation page: `current` first, then the most recent others
    pub fn display(&self, current: &str, limit: usize) -> Vec<&MappingEntry> {
        let latest = self.latest();
        let mut shown: Vec<&MappingEntry> = latest
            .iter()
            .copied()
            .filter(|entry| entry.keyword == current)
            .collect();
        shown.extend(latest.iter().copied().filter(|entry| entry.keyword != current));
        shown.truncate(limit);
        shown
    }
}

/// Group entries into non-empty topics, preserving order within each topic
pub fn group_by_topic<'a>(entries: &[&'a MappingEntry]) -> Vec<(Topic, Vec<&'a MappingEntry>)> {
    Topic::ALL
        .iter()
        .map(|topic| {
            let members: Vec<&MappingEntry> = entries
                .iter()
                .copied()
                .filter(|entry| Topic::classify(&entry.keyword) == *topic)
                .collect();
            (*topic, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

/// Render the root navigation page
pub fn render_nav_page(entries: &[&MappingEntry], generated_at: DateTime<Local>) -> String {
    let sections: String = group_by_topic(entries)
        .into_iter()
        .map(|(topic, members)| {
            let links: String = members
                .iter()
                .map(|entry| {
                    let cols = (entry.keyword.chars().count() / 5 + 1).min(4);
                    format!(
                        r#"
                <a href="{href}" class="keyword-link" title="{title}" style="--cols: {cols}">{keyword}</a>"#,
                        href = encode_double_quoted_attribute(&format!("{}/index.html", entry.dir)),
                        title = encode_double_quoted_attribute(&format!("{}的详细信息", entry.keyword)),
                        cols = cols,
                        keyword = encode_text(&entry.keyword),
                    )
                })
                .collect();
            format!(
                r#"
        <section class="keyword-section">
            <h2 class="section-title">{}</h2>
            <div class="keyword-list">{}
            </div>
        </section>"#,
                topic.label(),
                links
            )
        })
        .collect();

    let keywords: Vec<&str> = entries.iter().map(|entry| entry.keyword.as_str()).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>内容导航中心</title>
    <meta name="keywords" content="{keywords}">
    <meta name="description" content="热门内容导航，共{count}个主题。">
    <style>
        body {{ font-family: -apple-system, "Segoe UI", Roboto, "Noto Sans SC", sans-serif; margin: 0; color: #202124; }}
        .nav-container {{ max-width: 1200px; margin: 0 auto; padding: 24px 16px; }}
        .keyword-list {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; }}
        .keyword-link {{ grid-column: span var(--cols); padding: 10px 14px; border: 1px solid #e0e0e0; border-radius: 8px; color: #1a73e8; text-decoration: none; }}
        .keyword-link:hover {{ background: #f8f9fa; }}
        footer {{ color: #666; font-size: 13px; margin-top: 40px; text-align: center; }}
    </style>
</head>
<body>
    <div class="nav-container">
        <h1>内容导航中心</h1>{sections}
        <footer><p>更新时间：{timestamp}</p></footer>
    </div>
</body>
</html>
"#,
        keywords = encode_double_quoted_attribute(&keywords.join(", ")),
        count = entries.len(),
        sections = sections,
        timestamp = generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}
