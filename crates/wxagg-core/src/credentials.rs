use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Session credentials for the WeChat MP backend.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub cookie: String,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cookie: cookie.into(),
        }
    }

    /// Both token and cookie are present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && !self.cookie.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |s: &str| if s.is_empty() { "" } else { "[redacted]" };
        f.debug_struct("Credentials")
            .field("token", &mask(&self.token))
            .field("cookie", &mask(&self.cookie))
            .finish()
    }
}

/// Read credentials from `path`. A missing file yields empty credentials.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Credentials::default());
        }
        Err(e) => {
            return Err(ConfigError::FileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Credentials::default());
    }

    serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Persist credentials to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns `ConfigError::FileIo` if the file cannot be written.
pub fn save_credentials(path: &Path, credentials: &Credentials) -> Result<(), ConfigError> {
    let io_err = |e: std::io::Error| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_string_pretty(credentials).map_err(|e| ConfigError::JsonParse {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(path, body).map_err(io_err)
}
