//! Per-account fetch, normalize and persist loop.

use wxagg_core::{Account, ArticleStore, InsertOutcome, SourceType};

use crate::normalize::normalize;
use crate::sources::ArticleSource;
use crate::types::{AccountError, BatchOutcome, FetchResult};

/// Runs a source over a list of accounts and persists what it finds.
///
/// Accounts are processed strictly in order. A failing account is recorded
/// and the batch moves on.
pub struct IngestionPipeline<'a> {
    source: &'a dyn ArticleSource,
    store: &'a dyn ArticleStore,
    source_type: SourceType,
}

impl<'a> IngestionPipeline<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ArticleSource, store: &'a dyn ArticleStore) -> Self {
        Self {
            source,
            store,
            source_type: SourceType::Wechat,
        }
    }

    #[must_use]
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Ingest every enabled account in `accounts`.
    pub async fn run(&self, accounts: &[Account]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for account in accounts {
            if !account.enabled {
                tracing::debug!(account = %account.name, "skipping disabled account");
                continue;
            }

            let result = self.run_account(account, &mut outcome).await;
            outcome.total_inserted += result.articles_inserted;
            outcome.results.push(result);
        }

        tracing::info!(
            accounts_processed = outcome.accounts_processed,
            total_inserted = outcome.total_inserted,
            errors = outcome.errors.len(),
            "ingestion batch finished"
        );
        outcome
    }

    async fn run_account(&self, account: &Account, outcome: &mut BatchOutcome) -> FetchResult {
        let name = account.name.as_str();
        let mut result = FetchResult {
            account_name: name.to_string(),
            articles_found: 0,
            articles_inserted: 0,
            error: None,
        };

        tracing::info!(account = name, "fetching articles");
        let raws = match self.source.fetch(account).await {
            Ok(raws) => raws,
            Err(e) => {
                tracing::warn!(account = name, error = %e, "fetch failed");
                outcome.errors.push(AccountError {
                    account_name: name.to_string(),
                    message: e.to_string(),
                    auth_failed: e.is_auth(),
                });
                result.error = Some(e.to_string());
                return result;
            }
        };
        result.articles_found = raws.len();

        for raw in &raws {
            let article = match normalize(raw, name, self.source_type) {
                Ok(article) => article,
                Err(e) => {
                    tracing::warn!(account = name, error = %e, "dropping article");
                    continue;
                }
            };

            match self.store.insert_if_absent(&article).await {
                InsertOutcome::Inserted => {
                    result.articles_inserted += 1;
                    tracing::debug!(account = name, url = %article.canonical_url, "stored article");
                }
                InsertOutcome::AlreadyExists => {
                    tracing::debug!(
                        account = name,
                        url = %article.canonical_url,
                        "article already stored"
                    );
                }
                InsertOutcome::Failed(reason) => {
                    tracing::error!(
                        account = name,
                        url = %article.canonical_url,
                        error = %reason,
                        "persistence failed; abandoning remaining articles for account"
                    );
                    let message = format!("persistence failed: {reason}");
                    outcome.errors.push(AccountError {
                        account_name: name.to_string(),
                        message: message.clone(),
                        auth_failed: false,
                    });
                    result.error = Some(message);
                    return result;
                }
            }
        }

        outcome.accounts_processed += 1;
        tracing::info!(
            account = name,
            found = result.articles_found,
            inserted = result.articles_inserted,
            "account ingested"
        );
        result
    }
}
