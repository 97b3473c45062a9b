//! WeChat official account publish-list source.

mod decode;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use wxagg_core::{Account, Credentials};

use super::{build_http_client, ArticleSource};
use crate::error::FetchError;
use crate::types::{RawArticle, WechatOptions};

pub const DEFAULT_BASE_URL: &str = "https://mp.weixin.qq.com";
const PUBLISH_LIST_PATH: &str = "cgi-bin/appmsgpublish";

/// Fetches an account's recent posts from the MP backend.
///
/// Use [`WechatSource::new`] for production or [`WechatSource::with_base_url`]
/// to point at a mock server in tests.
pub struct WechatSource {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    options: WechatOptions,
}

impl WechatSource {
    /// # Errors
    ///
    /// Returns [`FetchError::Transient`] if the HTTP client cannot be built.
    pub fn new(
        credentials: Credentials,
        options: WechatOptions,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(credentials, options, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`FetchError::Transient`] if the HTTP client cannot be built, or
    /// [`FetchError::MalformedResponse`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        credentials: Credentials,
        options: WechatOptions,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let client = build_http_client(options.request_timeout_secs, user_agent)
            .map_err(|e| FetchError::transient("http client", e))?;

        // Trailing slash so `join` appends instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| FetchError::malformed("base url", format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            options,
        })
    }

    fn build_url(&self, fakeid: &str) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(PUBLISH_LIST_PATH)
            .map_err(|e| FetchError::malformed("base url", e))?;
        let count = self.options.fetch_count.to_string();
        url.query_pairs_mut()
            .append_pair("sub", "list")
            .append_pair("search_field", "null")
            .append_pair("begin", "0")
            .append_pair("count", &count)
            .append_pair("query", "")
            .append_pair("fakeid", fakeid)
            .append_pair("type", "101_1")
            .append_pair("free_publish_type", "1")
            .append_pair("sub_action", "list_ex")
            .append_pair("token", &self.credentials.token)
            .append_pair("lang", "zh_CN")
            .append_pair("f", "json")
            .append_pair("ajax", "1");
        Ok(url)
    }
}

#[async_trait]
impl ArticleSource for WechatSource {
    async fn fetch(&self, account: &Account) -> Result<Vec<RawArticle>, FetchError> {
        let context = account.name.as_str();

        if !self.credentials.is_valid() {
            return Err(FetchError::auth(context, "token or cookie is not configured"));
        }

        let url = self.build_url(&account.external_id)?;
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, self.credentials.cookie.trim())
            .send()
            .await
            .map_err(|e| FetchError::transient(context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::transient(context, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transient(context, e))?;
        if body.trim().is_empty() {
            return Err(FetchError::transient(context, "empty response body"));
        }

        let mut articles = decode::extract_articles(&body, context)?;
        let found = articles.len();
        if found > self.options.max_articles_per_fetch {
            articles.truncate(self.options.max_articles_per_fetch);
            tracing::info!(
                account = context,
                found,
                kept = self.options.max_articles_per_fetch,
                "truncated article list to newest entries"
            );
        }

        tracing::debug!(account = context, count = articles.len(), "fetched publish list");
        Ok(articles)
    }
}
