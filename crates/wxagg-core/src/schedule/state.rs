//! Durable scheduler memory.
//!
//! Two artifacts live in the data directory:
//!
//! * `schedule_status.json` holds `n_days_last_run`, the date of the last
//!   successful every-N-days run. Unknown keys are preserved on rewrite.
//! * `last_run_<identity>.log` holds the Unix time the rule last fired, and
//!   `last_run_<identity>.<YYYY-MM-DD_HH>.claim` is created exclusively to
//!   claim the window starting at that date and hour before any fetch starts.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RuleIdentity, RunState};

const STATUS_FILE: &str = "schedule_status.json";
const MARKER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum RunStateError {
    #[error("run state I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("run state file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Cross-invocation scheduler memory, keyed by rule identity.
pub trait RunStateStore: Send + Sync {
    /// Load the persisted state relevant to `identity`.
    ///
    /// # Errors
    ///
    /// Returns `RunStateError` if the backing storage cannot be read.
    fn load(&self, identity: &RuleIdentity) -> Result<RunState, RunStateError>;

    /// Atomically claim the window opening at `window_start` for `identity`
    /// and record `now` as its last fire.
    ///
    /// Returns `Ok(false)` when another invocation already holds the window.
    /// On error the window is left unclaimed.
    ///
    /// # Errors
    ///
    /// Returns `RunStateError` if the claim or the marker cannot be written.
    fn try_claim(
        &self,
        identity: &RuleIdentity,
        window_start: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<bool, RunStateError>;

    /// Record a successful every-N-days run on `date`.
    ///
    /// # Errors
    ///
    /// Returns `RunStateError` if the state cannot be persisted.
    fn record_success(&self, identity: &RuleIdentity, date: NaiveDate) -> Result<(), RunStateError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatusFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n_days_last_run: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// [`RunStateStore`] backed by files in a data directory.
#[derive(Debug, Clone)]
pub struct FileRunStateStore {
    data_dir: PathBuf,
}

impl FileRunStateStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join(STATUS_FILE)
    }

    #[must_use]
    pub fn marker_path(&self, identity: &RuleIdentity) -> PathBuf {
        self.data_dir.join(format!("last_run_{}.log", identity.file_stem()))
    }

    fn claim_prefix(identity: &RuleIdentity) -> String {
        format!("last_run_{}.", identity.file_stem())
    }

    fn claim_path(&self, identity: &RuleIdentity, window_start: NaiveDateTime) -> PathBuf {
        self.data_dir.join(format!(
            "{}{}.claim",
            Self::claim_prefix(identity),
            window_start.format("%Y-%m-%d_%H")
        ))
    }

    fn ensure_dir(&self) -> Result<(), RunStateError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| io_err(&self.data_dir, e))
    }

    fn read_status(&self) -> Result<StatusFile, RunStateError> {
        let path = self.status_path();
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(StatusFile::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| RunStateError::Parse {
                path: path.display().to_string(),
                source: e,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StatusFile::default()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    /// Status for scheduling decisions. A corrupt file reads as empty so a
    /// bad write can cost at most one extra every-N-days run.
    fn read_status_lenient(&self) -> Result<StatusFile, RunStateError> {
        match self.read_status() {
            Err(RunStateError::Parse { path, source }) => {
                tracing::warn!(
                    path = %path,
                    error = %source,
                    "unreadable schedule status; treating as first run"
                );
                Ok(StatusFile::default())
            }
            other => other,
        }
    }

    fn read_marker(
        &self,
        identity: &RuleIdentity,
    ) -> Result<Option<NaiveDateTime>, RunStateError> {
        let path = self.marker_path(identity);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let parsed = parse_marker(&content);
                if parsed.is_none() {
                    tracing::warn!(path = %path.display(), "ignoring unreadable run marker");
                }
                Ok(parsed)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    fn write_marker(
        &self,
        identity: &RuleIdentity,
        now: NaiveDateTime,
    ) -> Result<(), RunStateError> {
        write_atomically(&self.marker_path(identity), render_marker(now).as_bytes())
    }

    /// Remove claim files for `identity` from earlier days.
    fn prune_claims(&self, identity: &RuleIdentity, today: NaiveDate) {
        let prefix = Self::claim_prefix(identity);
        let Ok(entries) = std::fs::read_dir(&self.data_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(bucket) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".claim"))
            else {
                continue;
            };
            let stale = bucket
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .is_some_and(|d| d < today);
            if stale {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    tracing::debug!(file = name, error = %e, "failed to prune stale claim");
                }
            }
        }
    }
}

impl RunStateStore for FileRunStateStore {
    fn load(&self, identity: &RuleIdentity) -> Result<RunState, RunStateError> {
        let status = self.read_status_lenient()?;
        let last_fire_date = status.n_days_last_run.as_deref().and_then(|raw| {
            let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
            if parsed.is_none() {
                tracing::warn!(value = raw, "unparsable n_days_last_run; treating as first run");
            }
            parsed
        });
        let last_fired_at = self.read_marker(identity)?;
        Ok(RunState {
            last_fire_date,
            last_fired_at,
        })
    }

    fn try_claim(
        &self,
        identity: &RuleIdentity,
        window_start: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<bool, RunStateError> {
        self.ensure_dir()?;
        let path = self.claim_path(identity, window_start);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::info!(rule = %identity, claim = %path.display(), "window already claimed");
                return Ok(false);
            }
            Err(e) => return Err(io_err(&path, e)),
        }

        if let Err(e) = self.write_marker(identity, now) {
            // Release the window so a later tick can still fire it.
            if let Err(rm) = std::fs::remove_file(&path) {
                tracing::warn!(claim = %path.display(), error = %rm, "failed to release claim");
            }
            return Err(e);
        }
        self.prune_claims(identity, window_start.date());
        Ok(true)
    }

    fn record_success(
        &self,
        identity: &RuleIdentity,
        date: NaiveDate,
    ) -> Result<(), RunStateError> {
        self.ensure_dir()?;
        let mut status = self.read_status_lenient()?;
        status.n_days_last_run = Some(date.format("%Y-%m-%d").to_string());

        let path = self.status_path();
        let body = serde_json::to_string_pretty(&status).map_err(|e| RunStateError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        write_atomically(&path, body.as_bytes())?;
        tracing::info!(rule = %identity, %date, "recorded every-n-days run");
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> RunStateError {
    RunStateError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write through a sibling temp file and rename, so readers never observe a
/// partially written file.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), RunStateError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        io_err(path, e)
    })
}

/// Unix seconds when the local time is unambiguous, else the local rendering.
fn render_marker(now: NaiveDateTime) -> String {
    match Local.from_local_datetime(&now).single() {
        Some(ts) => ts.timestamp().to_string(),
        None => now.format(MARKER_TIME_FORMAT).to_string(),
    }
}

fn parse_marker(content: &str) -> Option<NaiveDateTime> {
    let trimmed = content.trim();
    if let Ok(secs) = trimmed.parse::<i64>() {
        return Local.timestamp_opt(secs, 0).single().map(|ts| ts.naive_local());
    }
    NaiveDateTime::parse_from_str(trimmed, MARKER_TIME_FORMAT).ok()
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
