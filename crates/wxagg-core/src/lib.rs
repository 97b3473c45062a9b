//! Shared configuration, domain types, and the schedule decision engine for
//! the article aggregator.

pub mod accounts;
pub mod app_config;
pub mod articles;
pub mod config;
pub mod credentials;
pub mod schedule;

use thiserror::Error;

pub use accounts::{load_accounts, Account, AccountsFile};
pub use app_config::{AppConfig, Environment};
pub use articles::{
    format_local_timestamp, ArticleStore, CanonicalArticle, InsertOutcome, SourceType, StoreError,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{load_credentials, save_credentials, Credentials};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
