use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only the commands that touch the article store need this.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub accounts_path: PathBuf,
    pub credentials_path: PathBuf,
    pub wechat_base_url: String,
    pub fetch_count: u32,
    pub max_articles_per_fetch: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub login_helper: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// The database URL, for commands that open the article store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// Path of the persisted recurrence rule (`schedule.json`).
    #[must_use]
    pub fn schedule_path(&self) -> PathBuf {
        self.config_dir.join("schedule.json")
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("config_dir", &self.config_dir)
            .field("data_dir", &self.data_dir)
            .field("accounts_path", &self.accounts_path)
            .field("credentials_path", &self.credentials_path)
            .field("wechat_base_url", &self.wechat_base_url)
            .field("fetch_count", &self.fetch_count)
            .field("max_articles_per_fetch", &self.max_articles_per_fetch)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("login_helper", &self.login_helper)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
