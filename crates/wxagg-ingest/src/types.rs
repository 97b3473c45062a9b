use chrono::{DateTime, Utc};

/// Source-specific article, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// WeChat publish-list request sizing.
#[derive(Debug, Clone, Copy)]
pub struct WechatOptions {
    /// Publish entries requested per call.
    pub fetch_count: u32,
    /// Articles kept per account after decoding, newest first.
    pub max_articles_per_fetch: usize,
    pub request_timeout_secs: u64,
}

impl Default for WechatOptions {
    fn default() -> Self {
        Self {
            fetch_count: 10,
            max_articles_per_fetch: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Per-account result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub account_name: String,
    pub articles_found: usize,
    pub articles_inserted: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountError {
    pub account_name: String,
    pub message: String,
    /// The failure means credentials must be refreshed.
    pub auth_failed: bool,
}

/// Aggregate result of one pipeline run over all accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Accounts whose fetch succeeded, including those with zero articles.
    pub accounts_processed: usize,
    pub total_inserted: usize,
    pub errors: Vec<AccountError>,
    pub results: Vec<FetchResult>,
}

impl BatchOutcome {
    /// No errors, or at least one insertion despite errors.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() || self.total_inserted > 0
    }

    #[must_use]
    pub fn needs_credential_refresh(&self) -> bool {
        self.errors.iter().any(|e| e.auth_failed)
    }

    /// One-line human summary of the counts.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = format!(
            "processed {} account(s), stored {} new article(s)",
            self.accounts_processed, self.total_inserted
        );
        if !self.errors.is_empty() {
            let detail: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.account_name, e.message))
                .collect();
            s.push_str(&format!(
                "; {} error(s): {}",
                self.errors.len(),
                detail.join("; ")
            ));
        }
        s
    }
}
