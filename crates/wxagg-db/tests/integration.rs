//! Offline unit tests for wxagg-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use wxagg_core::{AppConfig, Environment, SourceType};
use wxagg_db::{connect, ArticleRow, DbError, PoolConfig};

fn sample_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        env: Environment::Test,
        log_level: "info".to_string(),
        config_dir: PathBuf::from("./config"),
        data_dir: PathBuf::from("./data"),
        accounts_path: PathBuf::from("./config/accounts.yaml"),
        credentials_path: PathBuf::from("./config/credentials.json"),
        wechat_base_url: "https://mp.weixin.qq.com".to_string(),
        fetch_count: 10,
        max_articles_per_fetch: 5,
        request_timeout_secs: 30,
        user_agent: "ua".to_string(),
        login_helper: "python3 python_login_helper.py".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = sample_config();

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);

    let inverted = AppConfig {
        db_max_connections: 2,
        db_min_connections: 8,
        ..app_config
    };
    assert_eq!(PoolConfig::from_app_config(&inverted).min_connections, 2);
}

#[tokio::test]
async fn connect_without_database_url_is_a_config_error() {
    let app_config = AppConfig {
        database_url: None,
        ..sample_config()
    };
    let err = connect(&app_config).await.unwrap_err();
    assert!(matches!(err, DbError::Config(_)), "got {err:?}");
}

#[test]
fn article_row_converts_to_canonical() {
    let published = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let row = ArticleRow {
        id: 1,
        account_name: "example.com".to_string(),
        title: "Hello".to_string(),
        article_url: "https://example.com/p/1".to_string(),
        publish_timestamp: published,
        fetched_at: published,
        source_type: "forum_manual".to_string(),
    };
    let article = row.into_canonical();
    assert_eq!(article.canonical_url, "https://example.com/p/1");
    assert_eq!(article.source_type, SourceType::ForumManual);
    assert_eq!(article.published_at, published);
}

#[test]
fn unknown_source_type_reads_as_wechat() {
    let ts = Utc.timestamp_opt(0, 0).unwrap();
    let row = ArticleRow {
        id: 2,
        account_name: "a".to_string(),
        title: "t".to_string(),
        article_url: "https://x".to_string(),
        publish_timestamp: ts,
        fetched_at: ts,
        source_type: "legacy".to_string(),
    };
    assert_eq!(row.into_canonical().source_type, SourceType::Wechat);
}
