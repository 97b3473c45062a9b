use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_enabled() -> bool {
    true
}

/// A WeChat official account to ingest from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// WeChat's opaque account id (`fakeid`).
    #[serde(rename = "fakeid", default)]
    pub external_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Load and validate the accounts configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let accounts_file = parse_accounts(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    validate_accounts(&accounts_file)?;

    Ok(accounts_file.accounts)
}

fn parse_accounts(content: &str) -> Result<AccountsFile, serde_yaml::Error> {
    // An empty document means "no accounts", not a parse failure.
    if content.trim().is_empty() {
        return Ok(AccountsFile {
            accounts: Vec::new(),
        });
    }
    serde_yaml::from_str(content)
}

fn validate_accounts(accounts_file: &AccountsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for account in &accounts_file.accounts {
        let name = account.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "account name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(name.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate account name: '{}'",
                account.name
            )));
        }

        if account.enabled && account.external_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "account '{}' is enabled but has no fakeid",
                account.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
