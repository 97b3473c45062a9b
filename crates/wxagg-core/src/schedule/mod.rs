//! Schedule trigger decision engine.
//!
//! [`decide`] is a pure function of the recurrence rule, the wall-clock time
//! and the persisted run state. Persistence lives in [`state`]; the operator
//! facing rule file lives in [`rule_file`].

pub mod rule_file;
pub mod state;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub use rule_file::{
    get_recurrence_rule, load_schedule, save_schedule, set_recurrence_rule, ScheduleSettings,
};
pub use state::{FileRunStateStore, RunStateError, RunStateStore};

/// Length of the firing window that opens at the scheduled time.
pub const FIRING_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    Weekly { day_of_week: u8 },
    Monthly { day_of_month: u8 },
    EveryNDays { n: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub enabled: bool,
    pub period: Period,
    pub time: NaiveTime,
}

impl RecurrenceRule {
    /// Stable name of this rule, e.g. `weekly@03:00_day1`.
    #[must_use]
    pub fn identity(&self) -> RuleIdentity {
        let hhmm = self.time.format("%H:%M");
        let raw = match self.period {
            Period::Daily => format!("daily@{hhmm}"),
            Period::Weekly { day_of_week } => format!("weekly@{hhmm}_day{day_of_week}"),
            Period::Monthly { day_of_month } => format!("monthly@{hhmm}_date{day_of_month}"),
            Period::EveryNDays { .. } => format!("n_days@{hhmm}"),
        };
        RuleIdentity(raw)
    }
}

/// Rule name used to key run-state markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleIdentity(String);

impl RuleIdentity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity with every character outside `[A-Za-z0-9_]` replaced by `_`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

impl std::fmt::Display for RuleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduler memory loaded for one rule identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Date of the last successful every-N-days run.
    pub last_fire_date: Option<NaiveDate>,
    /// Local time the rule last fired, from the re-fire marker.
    pub last_fired_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    OutsideWindow,
    PeriodNotDue,
    AlreadyFired,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Disabled => "disabled",
            SkipReason::OutsideWindow => "outside time window",
            SkipReason::PeriodNotDue => "period not due",
            SkipReason::AlreadyFired => "already fired this window",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fire,
    Skip(SkipReason),
}

/// Decide whether `rule` should fire at local time `now`.
#[must_use]
pub fn decide(rule: &RecurrenceRule, now: NaiveDateTime, state: &RunState) -> Decision {
    if !rule.enabled {
        return Decision::Skip(SkipReason::Disabled);
    }

    if !in_window(rule.time, now.time()) {
        return Decision::Skip(SkipReason::OutsideWindow);
    }

    if !period_due(rule.period, now.date(), state.last_fire_date) {
        return Decision::Skip(SkipReason::PeriodNotDue);
    }

    if state
        .last_fired_at
        .is_some_and(|last| fired_in_window(rule, last, now))
    {
        return Decision::Skip(SkipReason::AlreadyFired);
    }

    Decision::Fire
}

/// Start of the firing window that `now` falls in.
///
/// Windows never cross midnight, so this is the scheduled time on the
/// calendar day of `now`. Claims and the re-fire guard are keyed on it, so a
/// window opening at 03:58 stays one bucket after the hour turns.
#[must_use]
pub fn window_start(rule: &RecurrenceRule, now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(rule.time)
}

/// Whether a fire at `last` belongs to the window containing `now`.
fn fired_in_window(rule: &RecurrenceRule, last: NaiveDateTime, now: NaiveDateTime) -> bool {
    last >= window_start(rule, now)
}

fn in_window(start: NaiveTime, now: NaiveTime) -> bool {
    if now < start {
        return false;
    }
    let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(FIRING_WINDOW_MINUTES));
    // A window crossing midnight is cut at the end of the day.
    wrapped != 0 || now < end
}

fn period_due(period: Period, today: NaiveDate, last_fire_date: Option<NaiveDate>) -> bool {
    match period {
        Period::Daily => true,
        Period::Weekly { day_of_week } => {
            today.weekday().number_from_monday() == u32::from(day_of_week)
        }
        Period::Monthly { day_of_month } => today.day() == u32::from(day_of_month),
        Period::EveryNDays { n } => match last_fire_date {
            None => true,
            Some(last) => (today - last).num_days() >= i64::from(n.max(1)),
        },
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
