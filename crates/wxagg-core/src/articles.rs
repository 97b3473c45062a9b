//! Canonical article record and the persistence port the ingestion pipeline
//! writes through.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when a source yields none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Column widths of the article table, in characters.
pub const TITLE_MAX_CHARS: usize = 512;
pub const ACCOUNT_NAME_MAX_CHARS: usize = 255;

/// URLs are unique on this many leading characters.
pub const URL_KEY_PREFIX_CHARS: usize = 767;

/// Longest prefix of `s` holding at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Where an article entered the store from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Wechat,
    ForumManual,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Wechat => "wechat",
            SourceType::ForumManual => "forum_manual",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wechat" => Ok(SourceType::Wechat),
            "forum_manual" => Ok(SourceType::ForumManual),
            other => Err(format!("unknown source type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    pub account_name: String,
    pub title: String,
    /// Sole deduplication key.
    pub canonical_url: String,
    pub published_at: DateTime<Utc>,
    pub source_type: SourceType,
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
    /// Any persistence failure other than a duplicate key.
    Failed(String),
}

#[derive(Debug, Error)]
#[error("article store error: {0}")]
pub struct StoreError(pub String);

/// Append-only article persistence keyed by canonical URL.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert `article` unless a row with the same canonical URL exists.
    ///
    /// Concurrent calls for the same URL must produce exactly one
    /// [`InsertOutcome::Inserted`]; a unique-key violation is reported as
    /// [`InsertOutcome::AlreadyExists`], never as `Failed`.
    async fn insert_if_absent(&self, article: &CanonicalArticle) -> InsertOutcome;

    /// Most recent articles, newest publish time first.
    async fn get_recent(&self, limit: i64) -> Result<Vec<CanonicalArticle>, StoreError>;

    async fn get_by_url(&self, url: &str) -> Result<Option<CanonicalArticle>, StoreError>;
}

/// Render a stored timestamp in process-local time for display.
#[must_use]
pub fn format_local_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
