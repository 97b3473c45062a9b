//! Operator-triggered operations: immediate fetch and manual URL ingestion.

use wxagg_core::{Account, ArticleStore, CanonicalArticle, InsertOutcome, SourceType};

use crate::error::RunError;
use crate::normalize::normalize;
use crate::pipeline::IngestionPipeline;
use crate::sources::web_page::WebPageSource;
use crate::sources::ArticleSource;

/// Result of an immediate fetch, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub success: bool,
    pub message: String,
    pub counts_summary: String,
}

/// Run the pipeline now, ignoring the schedule. Never touches run state.
pub async fn trigger_immediate_fetch(
    source: &dyn ArticleSource,
    store: &dyn ArticleStore,
    accounts: &[Account],
) -> FetchReport {
    if !accounts.iter().any(|a| a.enabled) {
        return FetchReport {
            success: true,
            message: "no accounts configured".to_string(),
            counts_summary: String::new(),
        };
    }

    let outcome = IngestionPipeline::new(source, store).run(accounts).await;
    let success = outcome.is_success();

    let mut message = if outcome.errors.is_empty() {
        format!(
            "processed {} account(s), stored {} new article(s)",
            outcome.accounts_processed, outcome.total_inserted
        )
    } else if success {
        format!(
            "some accounts failed, but {} new article(s) were stored",
            outcome.total_inserted
        )
    } else {
        "all accounts failed".to_string()
    };
    if outcome.needs_credential_refresh() {
        message.push_str("; credentials rejected, run `wxagg login`");
    }

    FetchReport {
        success,
        message,
        counts_summary: outcome.summary(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualAddOutcome {
    Inserted(CanonicalArticle),
    AlreadyExists(CanonicalArticle),
    /// A different URL sharing the unique key prefix is stored. Carries the
    /// article that was not stored.
    PrefixCollision(CanonicalArticle),
}

/// Fetch one page and store it as a `forum_manual` article.
///
/// # Errors
///
/// Returns [`RunError::Fetch`] if the page cannot be fetched,
/// [`RunError::Normalize`] if it yields no URL, or [`RunError::Store`] if the
/// insert fails for a reason other than a duplicate URL.
pub async fn add_manual_article(
    web: &WebPageSource,
    store: &dyn ArticleStore,
    url: &str,
    cookie: Option<&str>,
) -> Result<ManualAddOutcome, RunError> {
    let page = web.fetch(url, cookie).await?;
    let article = normalize(&page.article, &page.account_name, SourceType::ForumManual)?;

    match store.insert_if_absent(&article).await {
        InsertOutcome::Inserted => {
            tracing::info!(
                url = %article.canonical_url,
                title = %article.title,
                "manual article stored"
            );
            Ok(ManualAddOutcome::Inserted(article))
        }
        InsertOutcome::AlreadyExists => {
            let existing = store
                .get_by_url(&article.canonical_url)
                .await
                .map_err(|e| RunError::Store(e.to_string()))?;
            match existing {
                Some(existing) => {
                    tracing::info!(url = %existing.canonical_url, "manual article already stored");
                    Ok(ManualAddOutcome::AlreadyExists(existing))
                }
                None => {
                    tracing::warn!(
                        url = %article.canonical_url,
                        "not stored; another URL shares its unique key prefix"
                    );
                    Ok(ManualAddOutcome::PrefixCollision(article))
                }
            }
        }
        InsertOutcome::Failed(reason) => Err(RunError::Store(reason)),
    }
}
