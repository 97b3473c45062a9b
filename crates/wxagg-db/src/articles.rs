//! Database operations for the `articles` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use wxagg_core::{ArticleStore, CanonicalArticle, InsertOutcome, SourceType, StoreError};

use crate::DbError;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub account_name: String,
    pub title: String,
    pub article_url: String,
    pub publish_timestamp: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub source_type: String,
}

impl ArticleRow {
    /// Convert to the domain record. Unknown source types read as `wechat`.
    #[must_use]
    pub fn into_canonical(self) -> CanonicalArticle {
        let source_type = self.source_type.parse().unwrap_or_else(|e: String| {
            tracing::warn!(id = self.id, error = %e, "unknown source_type in articles row");
            SourceType::Wechat
        });
        CanonicalArticle {
            account_name: self.account_name,
            title: self.title,
            canonical_url: self.article_url,
            published_at: self.publish_timestamp,
            source_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert an article unless its URL is already stored.
///
/// Returns `Some(id)` for a new row and `None` when the URL already exists.
/// The check and the write are one statement, so concurrent callers racing on
/// the same URL see exactly one `Some`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] for any failure other than a duplicate URL.
pub async fn insert_article_if_absent(
    pool: &PgPool,
    article: &CanonicalArticle,
) -> Result<Option<i64>, DbError> {
    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles \
             (account_name, title, article_url, publish_timestamp, source_type) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT DO NOTHING \
         RETURNING id",
    )
    .bind(&article.account_name)
    .bind(&article.title)
    .bind(&article.canonical_url)
    .bind(article.published_at)
    .bind(article.source_type.as_str())
    .fetch_optional(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(DbError::from(e)),
    }
}

/// List the most recent articles, newest publish time first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_recent_articles(pool: &PgPool, limit: i64) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, account_name, title, article_url, publish_timestamp, fetched_at, source_type \
         FROM articles \
         ORDER BY publish_timestamp DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Look up an article by its exact URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article_by_url(pool: &PgPool, url: &str) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, account_name, title, article_url, publish_timestamp, fetched_at, source_type \
         FROM articles \
         WHERE article_url = $1",
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Total number of stored articles.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &PgPool) -> Result<i64, DbError> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

// ---------------------------------------------------------------------------
// ArticleStore adapter
// ---------------------------------------------------------------------------

/// [`ArticleStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn insert_if_absent(&self, article: &CanonicalArticle) -> InsertOutcome {
        match insert_article_if_absent(&self.pool, article).await {
            Ok(Some(_)) => InsertOutcome::Inserted,
            Ok(None) => InsertOutcome::AlreadyExists,
            Err(e) => {
                tracing::error!(
                    url = %article.canonical_url,
                    error = %e,
                    "article insert failed"
                );
                InsertOutcome::Failed(e.to_string())
            }
        }
    }

    async fn get_recent(&self, limit: i64) -> Result<Vec<CanonicalArticle>, StoreError> {
        get_recent_articles(&self.pool, limit)
            .await
            .map(|rows| rows.into_iter().map(ArticleRow::into_canonical).collect())
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<CanonicalArticle>, StoreError> {
        get_article_by_url(&self.pool, url)
            .await
            .map(|row| row.map(ArticleRow::into_canonical))
            .map_err(|e| StoreError(e.to_string()))
    }
}
