//! Generic web page source for manually added articles.

mod date;
mod html;
mod urls;

use chrono::{DateTime, Utc};
use reqwest::{header, Client};

use super::build_http_client;
use crate::error::FetchError;
use crate::types::RawArticle;

/// A fetched page and the account name derived from its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub account_name: String,
    pub article: RawArticle,
}

/// Fetches one URL and extracts title and publish time heuristically.
pub struct WebPageSource {
    client: Client,
}

impl WebPageSource {
    /// # Errors
    ///
    /// Returns [`FetchError::Transient`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = build_http_client(timeout_secs, user_agent)
            .map_err(|e| FetchError::transient("http client", e))?;
        Ok(Self { client })
    }

    /// Fetch `url`, optionally sending `cookie`.
    ///
    /// The returned article always carries a title and a publish time; both
    /// fall back (URL-derived name, current time) when the page has none.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MalformedResponse`] if `url` is not absolute http(s) or
    ///   the body holds no markup at all.
    /// - [`FetchError::Transient`] on transport failure, HTTP status >= 400 or
    ///   an empty body.
    pub async fn fetch(&self, url: &str, cookie: Option<&str>) -> Result<FetchedPage, FetchError> {
        self.fetch_at(url, cookie, Utc::now()).await
    }

    async fn fetch_at(
        &self,
        url: &str,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FetchedPage, FetchError> {
        let parsed = urls::parse_article_url(url)
            .ok_or_else(|| FetchError::malformed(url, "not an absolute http(s) URL"))?;

        let mut request = self.client.get(parsed.clone());
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            request = request.header(header::COOKIE, cookie);
        }
        tracing::info!(url = %parsed, with_cookie = cookie.is_some(), "fetching web page");

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transient(url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::transient(url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transient(url, e))?;
        if body.trim().is_empty() {
            return Err(FetchError::transient(url, "empty response body"));
        }

        let doc = html::parse(&body);
        if !html::has_markup(&doc) {
            return Err(FetchError::malformed(url, "no HTML elements in response"));
        }

        let title = html::extract_title(&doc).unwrap_or_else(|| {
            tracing::debug!(url, "no title candidates; deriving from URL");
            urls::title_from_url(&parsed)
        });

        let published_at = html::date_candidates(&doc)
            .iter()
            .find_map(|raw| date::parse_lenient(raw))
            .unwrap_or(now);

        Ok(FetchedPage {
            account_name: urls::account_name_from_url(&parsed),
            article: RawArticle {
                title: Some(title),
                url: Some(url.trim().to_string()),
                published_at: Some(published_at),
            },
        })
    }
}
