use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty());

    let env = parse_environment(&or_default("WXAGG_ENV", "development"))?;
    let log_level = or_default("WXAGG_LOG_LEVEL", "info");

    let config_dir = PathBuf::from(or_default("WXAGG_CONFIG_DIR", "./config"));
    let data_dir = PathBuf::from(or_default("WXAGG_DATA_DIR", "./data"));
    let accounts_path = lookup("WXAGG_ACCOUNTS_PATH")
        .map_or_else(|_| config_dir.join("accounts.yaml"), PathBuf::from);
    let credentials_path = lookup("WXAGG_CREDENTIALS_PATH")
        .map_or_else(|_| config_dir.join("credentials.json"), PathBuf::from);

    let wechat_base_url = or_default("WXAGG_WECHAT_BASE_URL", "https://mp.weixin.qq.com");
    let fetch_count = parse_u32("WXAGG_FETCH_COUNT", "10")?;
    let max_articles_per_fetch = parse_usize("WXAGG_MAX_ARTICLES_PER_FETCH", "5")?;
    let request_timeout_secs = parse_u64("WXAGG_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("WXAGG_USER_AGENT", DEFAULT_USER_AGENT);
    let login_helper = or_default("WXAGG_LOGIN_HELPER", "python3 python_login_helper.py");

    if login_helper.split_whitespace().next().is_none() {
        return Err(ConfigError::InvalidEnvVar {
            var: "WXAGG_LOGIN_HELPER".to_string(),
            reason: "command must not be empty".to_string(),
        });
    }

    let db_max_connections = parse_u32("WXAGG_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("WXAGG_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("WXAGG_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        config_dir,
        data_dir,
        accounts_path,
        credentials_path,
        wechat_base_url,
        fetch_count,
        max_articles_per_fetch,
        request_timeout_secs,
        user_agent,
        login_helper,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WXAGG_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
