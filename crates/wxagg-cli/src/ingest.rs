//! Ingestion command handlers: the cron entry point, immediate fetch, manual
//! URL add and the recent-article listing.
//!
//! Per-account failures never fail the command; they are part of the printed
//! summary. Only configuration and run-state problems are propagated.

use anyhow::Context;
use sqlx::PgPool;

use wxagg_core::schedule::FileRunStateStore;
use wxagg_core::{format_local_timestamp, Account, AppConfig, ArticleStore};
use wxagg_db::PgArticleStore;
use wxagg_ingest::{
    add_manual_article, trigger_immediate_fetch, BatchOutcome, ManualAddOutcome, Runner,
    ScheduledRun, WebPageSource, WechatOptions, WechatSource,
};

fn build_wechat_source(config: &AppConfig) -> anyhow::Result<WechatSource> {
    let credentials = wxagg_core::load_credentials(&config.credentials_path)
        .context("failed to load credentials")?;
    if !credentials.is_valid() {
        tracing::warn!(
            path = %config.credentials_path.display(),
            "no WeChat credentials configured; run `wxagg login`"
        );
    }

    let options = WechatOptions {
        fetch_count: config.fetch_count,
        max_articles_per_fetch: config.max_articles_per_fetch,
        request_timeout_secs: config.request_timeout_secs,
    };
    WechatSource::with_base_url(
        credentials,
        options,
        &config.user_agent,
        &config.wechat_base_url,
    )
    .context("failed to build WeChat client")
}

fn load_accounts(config: &AppConfig) -> anyhow::Result<Vec<Account>> {
    wxagg_core::load_accounts(&config.accounts_path).with_context(|| {
        format!(
            "failed to load accounts from {}",
            config.accounts_path.display()
        )
    })
}

fn print_outcome(outcome: &BatchOutcome) {
    println!("{}", outcome.summary());
    for result in &outcome.results {
        match &result.error {
            Some(e) => println!("  {:<24} failed: {e}", result.account_name),
            None => println!(
                "  {:<24} found {:>3}, stored {:>3}",
                result.account_name, result.articles_found, result.articles_inserted
            ),
        }
    }
    if outcome.needs_credential_refresh() {
        println!("credentials were rejected; run `wxagg login` to refresh them");
    }
}

/// Cron entry point: consult the schedule and ingest when it is due.
pub(crate) async fn run_cron(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let accounts = load_accounts(config)?;
    let source = build_wechat_source(config)?;
    let store = PgArticleStore::new(pool.clone());
    let run_state = FileRunStateStore::new(&config.data_dir);
    let runner = Runner::new(&source, &store, &run_state, config.schedule_path());

    let now = chrono::Local::now().naive_local();
    match runner
        .run_scheduled(&accounts, now)
        .await
        .context("scheduled run failed")?
    {
        ScheduledRun::Skipped(reason) => println!("skipped: {reason}"),
        ScheduledRun::Fired { outcome, .. } => print_outcome(&outcome),
    }
    Ok(())
}

/// Fetch every enabled account now. Does not touch the run state.
pub(crate) async fn run_fetch_now(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let accounts = load_accounts(config)?;
    let source = build_wechat_source(config)?;
    let store = PgArticleStore::new(pool.clone());

    let report = trigger_immediate_fetch(&source, &store, &accounts).await;
    println!(
        "{}: {}",
        if report.success { "ok" } else { "failed" },
        report.message
    );
    if !report.counts_summary.is_empty() {
        println!("{}", report.counts_summary);
    }
    if !report.success {
        anyhow::bail!("immediate fetch failed");
    }
    Ok(())
}

pub(crate) async fn run_add_url(
    pool: &PgPool,
    config: &AppConfig,
    url: &str,
    cookie: Option<&str>,
) -> anyhow::Result<()> {
    let web = WebPageSource::new(config.request_timeout_secs, &config.user_agent)
        .context("failed to build HTTP client")?;
    let store = PgArticleStore::new(pool.clone());

    let outcome = add_manual_article(&web, &store, url, cookie)
        .await
        .with_context(|| format!("failed to add {url}"))?;

    let (verb, article) = match &outcome {
        ManualAddOutcome::Inserted(a) => ("added", a),
        ManualAddOutcome::AlreadyExists(a) => ("already stored", a),
        ManualAddOutcome::PrefixCollision(a) => ("not stored, URL prefix collides", a),
    };
    println!(
        "{verb}: {} [{}] {}",
        article.title,
        article.account_name,
        format_local_timestamp(article.published_at)
    );
    Ok(())
}

pub(crate) async fn run_recent(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let store = PgArticleStore::new(pool.clone());
    let articles = store
        .get_recent(limit.max(1))
        .await
        .context("failed to query recent articles")?;

    if articles.is_empty() {
        println!("no articles stored yet");
        return Ok(());
    }
    for a in &articles {
        println!(
            "{}  {:<12} {:<20} {}\n    {}",
            format_local_timestamp(a.published_at),
            a.source_type,
            a.account_name,
            a.title,
            a.canonical_url
        );
    }
    Ok(())
}
