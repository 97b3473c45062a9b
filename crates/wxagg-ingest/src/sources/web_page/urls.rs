//! URL validation and URL-derived fallbacks.

use reqwest::Url;

/// Prefix of the title used when a page has none.
const FALLBACK_TITLE_PREFIX: &str = "Untitled";

/// Parse `raw` as an absolute http(s) URL with a host.
pub(super) fn parse_article_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().filter(|h| !h.is_empty())?;
    Some(url)
}

/// Host of `url`, lowercased, without a leading `www.`.
pub(super) fn account_name_from_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => host,
    }
}

/// `"Untitled - <last path segment>"`, falling back to the host for bare domains.
pub(super) fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string());
    format!("{FALLBACK_TITLE_PREFIX} - {segment}")
}
