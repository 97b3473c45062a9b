//! Test doubles shared by the ingestion integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use wxagg_core::articles::{truncate_chars, URL_KEY_PREFIX_CHARS};
use wxagg_core::{Account, ArticleStore, CanonicalArticle, InsertOutcome, StoreError};
use wxagg_ingest::{ArticleSource, FetchError, RawArticle};

/// In-memory store unique on the URL key prefix, like the articles table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, CanonicalArticle>>,
    /// URLs whose insert reports a persistence failure.
    failing_urls: Vec<String>,
}

impl MemoryStore {
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            rows: Mutex::default(),
            failing_urls: urls.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Exact-URL lookup.
    pub fn get(&self, url: &str) -> Option<CanonicalArticle> {
        self.rows
            .lock()
            .unwrap()
            .get(url_key(url))
            .filter(|a| a.canonical_url == url)
            .cloned()
    }
}

fn url_key(url: &str) -> &str {
    truncate_chars(url, URL_KEY_PREFIX_CHARS)
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert_if_absent(&self, article: &CanonicalArticle) -> InsertOutcome {
        if self.failing_urls.contains(&article.canonical_url) {
            return InsertOutcome::Failed("disk full".to_string());
        }
        let mut rows = self.rows.lock().unwrap();
        let key = url_key(&article.canonical_url).to_string();
        if rows.contains_key(&key) {
            return InsertOutcome::AlreadyExists;
        }
        rows.insert(key, article.clone());
        InsertOutcome::Inserted
    }

    async fn get_recent(&self, limit: i64) -> Result<Vec<CanonicalArticle>, StoreError> {
        let mut all: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<CanonicalArticle>, StoreError> {
        Ok(self.get(url))
    }
}

/// Canned per-account responses, keyed by account name.
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<String, Result<Vec<RawArticle>, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_articles(mut self, account: &str, articles: Vec<RawArticle>) -> Self {
        self.responses.insert(account.to_string(), Ok(articles));
        self
    }

    pub fn with_error(mut self, account: &str, error: FetchError) -> Self {
        self.responses.insert(account.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn fetch(&self, account: &Account) -> Result<Vec<RawArticle>, FetchError> {
        self.calls.lock().unwrap().push(account.name.clone());
        match self.responses.get(&account.name) {
            Some(Ok(articles)) => Ok(articles.clone()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Ok(Vec::new()),
        }
    }
}

fn clone_error(e: &FetchError) -> FetchError {
    match e {
        FetchError::Transient { context, message } => FetchError::Transient {
            context: context.clone(),
            message: message.clone(),
        },
        FetchError::AuthFailed { context, message } => FetchError::AuthFailed {
            context: context.clone(),
            message: message.clone(),
        },
        FetchError::MalformedResponse { context, message } => FetchError::MalformedResponse {
            context: context.clone(),
            message: message.clone(),
        },
    }
}

pub fn account(name: &str) -> Account {
    Account {
        name: name.to_string(),
        external_id: format!("fake-{name}"),
        enabled: true,
    }
}

pub fn raw(title: &str, url: &str, epoch: i64) -> RawArticle {
    RawArticle {
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        published_at: Utc.timestamp_opt(epoch, 0).single(),
    }
}

pub fn auth_error(account: &str) -> FetchError {
    FetchError::AuthFailed {
        context: account.to_string(),
        message: "invalid session".to_string(),
    }
}
