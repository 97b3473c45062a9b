//! Top-level scheduled run: consult the schedule, claim the window, ingest.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use wxagg_core::schedule::{
    self, decide, Decision, Period, RecurrenceRule, RunStateStore, SkipReason,
};
use wxagg_core::{Account, ArticleStore};

use crate::error::RunError;
use crate::pipeline::IngestionPipeline;
use crate::sources::ArticleSource;
use crate::types::BatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireReason {
    /// No usable rule file; every invocation runs.
    Unscheduled,
    /// The recurrence rule matched and the window was claimed.
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledRun {
    Skipped(SkipReason),
    Fired {
        reason: FireReason,
        outcome: BatchOutcome,
    },
}

/// Wires the schedule engine, run state and ingestion pipeline together.
pub struct Runner<'a> {
    source: &'a dyn ArticleSource,
    store: &'a dyn ArticleStore,
    run_state: &'a dyn RunStateStore,
    schedule_path: PathBuf,
}

impl<'a> Runner<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn ArticleSource,
        store: &'a dyn ArticleStore,
        run_state: &'a dyn RunStateStore,
        schedule_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            store,
            run_state,
            schedule_path: schedule_path.into(),
        }
    }

    /// Run once for a cron tick at local time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::RunState`] if the run state cannot be read or the
    /// window cannot be claimed. Fetch failures are reported in the outcome.
    pub async fn run_scheduled(
        &self,
        accounts: &[Account],
        now: NaiveDateTime,
    ) -> Result<ScheduledRun, RunError> {
        let Some(rule) = load_rule(&self.schedule_path) else {
            tracing::info!("no schedule configured; running unconditionally");
            let outcome = self.ingest(accounts).await;
            return Ok(ScheduledRun::Fired {
                reason: FireReason::Unscheduled,
                outcome,
            });
        };

        let identity = rule.identity();
        let state = self.run_state.load(&identity)?;

        if let Decision::Skip(reason) = decide(&rule, now, &state) {
            tracing::info!(rule = %identity, %reason, now = %now, "not firing");
            return Ok(ScheduledRun::Skipped(reason));
        }

        let window = schedule::window_start(&rule, now);
        if !self.run_state.try_claim(&identity, window, now)? {
            tracing::info!(rule = %identity, "window already claimed by another run");
            return Ok(ScheduledRun::Skipped(SkipReason::AlreadyFired));
        }

        tracing::info!(rule = %identity, now = %now, "schedule matched; ingesting");
        let outcome = self.ingest(accounts).await;

        if matches!(rule.period, Period::EveryNDays { .. }) {
            if outcome.is_success() {
                if let Err(e) = self.run_state.record_success(&identity, now.date()) {
                    tracing::warn!(rule = %identity, error = %e, "failed to record run date");
                }
            } else {
                tracing::info!(
                    rule = %identity,
                    "batch failed; leaving last run date so the next window retries"
                );
            }
        }

        Ok(ScheduledRun::Fired {
            reason: FireReason::Scheduled,
            outcome,
        })
    }

    /// Run the pipeline without consulting or touching the schedule.
    pub async fn ingest(&self, accounts: &[Account]) -> BatchOutcome {
        IngestionPipeline::new(self.source, self.store)
            .run(accounts)
            .await
    }
}

/// Load the rule; a missing or unreadable file means "not scheduled".
fn load_rule(path: &Path) -> Option<RecurrenceRule> {
    match schedule::load_schedule(path) {
        Ok(Some(settings)) => Some(settings.to_rule()),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "schedule file unreadable; running as if not scheduled"
            );
            None
        }
    }
}
