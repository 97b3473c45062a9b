//! Article source abstractions.

pub mod web_page;
pub mod wechat;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use wxagg_core::Account;

use crate::error::FetchError;
use crate::types::RawArticle;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 5;

/// A source that yields the recent articles of an account.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch the newest articles of `account`, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the account cannot be fetched at all.
    async fn fetch(&self, account: &Account) -> Result<Vec<RawArticle>, FetchError>;
}

/// Build the shared HTTP client: fixed deadline, bounded redirects.
///
/// # Errors
///
/// Returns [`reqwest::Error`] if the client cannot be constructed.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs.max(1))))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(user_agent)
        .build()
}
