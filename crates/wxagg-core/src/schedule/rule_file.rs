//! The operator-facing `schedule.json` file.
//!
//! Values are read leniently (numbers may arrive as strings and the reverse)
//! and illegal values are coerced to safe defaults instead of rejected.

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Period, RecurrenceRule};
use crate::ConfigError;

const DEFAULT_TIME: &str = "03:00";
const DEFAULT_DAY_OF_WEEK: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enabled: bool,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub month_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub n_value: Option<i64>,
}

fn default_period() -> String {
    "daily".to_string()
}

fn default_time() -> String {
    DEFAULT_TIME.to_string()
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            period: default_period(),
            time: default_time(),
            day_of_week: Some(DEFAULT_DAY_OF_WEEK.to_string()),
            month_day: None,
            n_value: None,
        }
    }
}

impl ScheduleSettings {
    /// Interpret the settings as a rule, coercing illegal values.
    #[must_use]
    pub fn to_rule(&self) -> RecurrenceRule {
        let time = parse_hhmm(&self.time).unwrap_or_else(default_naive_time);

        let period = match self.period.as_str() {
            "weekly" => Period::Weekly {
                day_of_week: coerce_day_of_week(self.day_of_week.as_deref()),
            },
            "monthly" => Period::Monthly {
                day_of_month: coerce_month_day(self.month_day),
            },
            "n_days" => Period::EveryNDays {
                n: coerce_n(self.n_value),
            },
            "every_two_days" => Period::EveryNDays { n: 2 },
            "every_three_days" => Period::EveryNDays { n: 3 },
            _ => Period::Daily,
        };

        RecurrenceRule {
            enabled: self.enabled,
            period,
            time,
        }
    }

    /// Canonical settings for `rule`; only the selector for its period is set.
    #[must_use]
    pub fn from_rule(rule: &RecurrenceRule) -> Self {
        let mut settings = Self {
            enabled: rule.enabled,
            period: String::new(),
            time: rule.time.format("%H:%M").to_string(),
            day_of_week: None,
            month_day: None,
            n_value: None,
        };
        match rule.period {
            Period::Daily => settings.period = "daily".to_string(),
            Period::Weekly { day_of_week } => {
                settings.period = "weekly".to_string();
                settings.day_of_week = Some(day_of_week.to_string());
            }
            Period::Monthly { day_of_month } => {
                settings.period = "monthly".to_string();
                settings.month_day = Some(i64::from(day_of_month));
            }
            Period::EveryNDays { n } => {
                settings.period = "n_days".to_string();
                settings.n_value = Some(i64::from(n));
            }
        }
        settings
    }

    /// Settings with every field coerced to a legal value.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self::from_rule(&self.to_rule())
    }
}

fn default_naive_time() -> NaiveTime {
    NaiveTime::from_hms_opt(3, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse `H:MM` / `HH:MM` with hour 0..=23 and minute 00..=59.
fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn coerce_day_of_week(raw: Option<&str>) -> u8 {
    raw.and_then(|s| s.trim().parse::<u8>().ok())
        .filter(|d| (1..=7).contains(d))
        .unwrap_or(1)
}

fn coerce_month_day(raw: Option<i64>) -> u8 {
    raw.filter(|d| (1..=31).contains(d))
        .and_then(|d| u8::try_from(d).ok())
        .unwrap_or(1)
}

fn coerce_n(raw: Option<i64>) -> u32 {
    raw.filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        serde_json::Value::String(s) => matches!(s.trim(), "true" | "1" | "on" | "yes"),
        _ => false,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// File access
// ---------------------------------------------------------------------------

/// Read `schedule.json`. Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_schedule(path: &Path) -> Result<Option<ScheduleSettings>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::FileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::JsonParse {
            path: path.display().to_string(),
            source: e,
        })
}

/// Write `settings` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns `ConfigError::FileIo` if the directory or file cannot be written.
pub fn save_schedule(path: &Path, settings: &ScheduleSettings) -> Result<(), ConfigError> {
    let io_err = |e: std::io::Error| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_string_pretty(settings).map_err(|e| ConfigError::JsonParse {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(path, body).map_err(io_err)
}

/// Current settings, or the defaults when no file has been saved yet.
///
/// # Errors
///
/// Returns `ConfigError` if an existing file cannot be read or parsed.
pub fn get_recurrence_rule(path: &Path) -> Result<ScheduleSettings, ConfigError> {
    Ok(load_schedule(path)?.unwrap_or_default())
}

/// Coerce `settings` to legal values and persist them. Returns what was saved.
///
/// # Errors
///
/// Returns `ConfigError::FileIo` if the file cannot be written.
pub fn set_recurrence_rule(
    path: &Path,
    settings: &ScheduleSettings,
) -> Result<ScheduleSettings, ConfigError> {
    let normalized = settings.normalized();
    save_schedule(path, &normalized)?;
    tracing::info!(
        path = %path.display(),
        enabled = normalized.enabled,
        period = %normalized.period,
        time = %normalized.time,
        "schedule settings saved"
    );
    Ok(normalized)
}

#[cfg(test)]
#[path = "rule_file_test.rs"]
mod tests;
