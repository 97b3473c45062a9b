//! Raw article to canonical record mapping.

use chrono::{DateTime, Utc};
use thiserror::Error;
use wxagg_core::articles::{
    truncate_chars, ACCOUNT_NAME_MAX_CHARS, DEFAULT_TITLE, TITLE_MAX_CHARS,
};
use wxagg_core::{CanonicalArticle, SourceType};

use crate::types::RawArticle;

/// Account name used when the caller has none.
pub const DEFAULT_ACCOUNT_NAME: &str = "Unknown Account";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("article has no URL")]
    MissingUrl,
}

/// Normalize `raw`, stamping missing publish times with the current time.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingUrl`] if the article has no usable URL.
pub fn normalize(
    raw: &RawArticle,
    account_name: &str,
    source_type: SourceType,
) -> Result<CanonicalArticle, NormalizeError> {
    normalize_at(raw, account_name, source_type, Utc::now())
}

/// Like [`normalize`] with an explicit "now".
///
/// # Errors
///
/// Returns [`NormalizeError::MissingUrl`] if the article has no usable URL.
pub fn normalize_at(
    raw: &RawArticle,
    account_name: &str,
    source_type: SourceType,
    now: DateTime<Utc>,
) -> Result<CanonicalArticle, NormalizeError> {
    let canonical_url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(NormalizeError::MissingUrl)?
        .to_string();

    let title = raw
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .map(|t| truncate_chars(&t, TITLE_MAX_CHARS).trim_end().to_string())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    // Oversized values would be rejected by the store and abandon the account.
    let account_name = match account_name.trim() {
        "" => DEFAULT_ACCOUNT_NAME.to_string(),
        name => truncate_chars(name, ACCOUNT_NAME_MAX_CHARS).trim_end().to_string(),
    };

    Ok(CanonicalArticle {
        account_name,
        title,
        canonical_url,
        published_at: raw.published_at.unwrap_or(now),
        source_type,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
