//! Credential refresh through an external login helper.
//!
//! The helper is an interactive program (it drives a browser and waits for a
//! QR-code scan). On completion it prints one JSON object as the last line of
//! stdout: `{"success": bool, "token"?, "cookie"?, "error"?, "details"?}`.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use wxagg_core::Credentials;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("login helper command is empty")]
    EmptyCommand,

    #[error("failed to start login helper '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("login helper exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("login helper produced no output")]
    EmptyOutput,

    #[error("login helper output is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("login failed: {message}")]
    Rejected {
        message: String,
        details: Option<String>,
    },

    #[error("login helper reported success without {0}")]
    MissingField(&'static str),
}

/// Something that can obtain fresh session credentials.
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RefreshError`] if fresh credentials could not be obtained.
    async fn refresh(&self) -> Result<Credentials, RefreshError>;
}

#[derive(Debug, Deserialize)]
struct HelperOutput {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    cookie: Option<String>,
    #[serde(default, alias = "message")]
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Decode the helper's stdout; the last non-empty line must be the result.
///
/// # Errors
///
/// Returns [`RefreshError`] if the output is empty, undecodable, reports
/// failure, or lacks a token or cookie.
pub fn parse_helper_output(stdout: &str) -> Result<Credentials, RefreshError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or(RefreshError::EmptyOutput)?;

    let out: HelperOutput = serde_json::from_str(line)?;

    if !out.success {
        return Err(RefreshError::Rejected {
            message: out.error.unwrap_or_else(|| "unknown error".to_string()),
            details: out.details.map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
        });
    }

    let token = out
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(RefreshError::MissingField("token"))?;
    let cookie = out
        .cookie
        .filter(|c| !c.trim().is_empty())
        .ok_or(RefreshError::MissingField("cookie"))?;

    Ok(Credentials::new(token, cookie))
}

/// Runs the login helper as a child process.
#[derive(Debug, Clone)]
pub struct ProcessRefresher {
    program: String,
    args: Vec<String>,
}

impl ProcessRefresher {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line such as
    /// `python3 python_login_helper.py`.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::EmptyCommand`] for a blank command line.
    pub fn from_command_line(command: &str) -> Result<Self, RefreshError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(RefreshError::EmptyCommand)?;
        Ok(Self::new(program, parts.collect()))
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl CredentialRefresher for ProcessRefresher {
    async fn refresh(&self) -> Result<Credentials, RefreshError> {
        tracing::info!(command = %self.display(), "starting login helper");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RefreshError::Spawn {
                command: self.display(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "wxagg_ingest::login_helper", "{line}");
        }

        if !output.status.success() {
            // The helper reports structured failures on stdout even when it
            // exits non-zero; prefer that message when present.
            if let Err(e @ RefreshError::Rejected { .. }) = parse_helper_output(&stdout) {
                return Err(e);
            }
            return Err(RefreshError::ExitStatus {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let credentials = parse_helper_output(&stdout)?;
        tracing::info!("login helper returned fresh credentials");
        Ok(credentials)
    }
}
