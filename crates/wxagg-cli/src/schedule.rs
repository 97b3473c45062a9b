//! `schedule show` / `schedule set`.

use anyhow::Context;
use clap::Subcommand;

use wxagg_core::schedule::{get_recurrence_rule, set_recurrence_rule, ScheduleSettings};
use wxagg_core::AppConfig;

#[derive(Debug, Subcommand)]
pub enum ScheduleCommands {
    /// Print the current recurrence rule (defaults when none is saved)
    Show,
    /// Update the recurrence rule; omitted flags keep their current value
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        /// daily, weekly, monthly or n_days
        #[arg(long)]
        period: Option<String>,
        /// Start of the firing window, HH:MM local time
        #[arg(long)]
        time: Option<String>,
        /// ISO weekday, 1 = Monday .. 7 = Sunday
        #[arg(long)]
        day_of_week: Option<String>,
        #[arg(long)]
        month_day: Option<i64>,
        /// Interval for the n_days period
        #[arg(long)]
        n_value: Option<i64>,
    },
}

pub(crate) fn run_schedule_command(
    config: &AppConfig,
    command: ScheduleCommands,
) -> anyhow::Result<()> {
    let path = config.schedule_path();
    let current = get_recurrence_rule(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match command {
        ScheduleCommands::Show => print_settings(&current),
        ScheduleCommands::Set {
            enabled,
            period,
            time,
            day_of_week,
            month_day,
            n_value,
        } => {
            let requested = ScheduleSettings {
                enabled: enabled.unwrap_or(current.enabled),
                period: period.unwrap_or(current.period),
                time: time.unwrap_or(current.time),
                day_of_week: day_of_week.or(current.day_of_week),
                month_day: month_day.or(current.month_day),
                n_value: n_value.or(current.n_value),
            };
            let saved = set_recurrence_rule(&path, &requested)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("saved:");
            print_settings(&saved);
        }
    }
    Ok(())
}

fn print_settings(settings: &ScheduleSettings) {
    let rule = settings.to_rule();
    println!("enabled:  {}", settings.enabled);
    println!("period:   {}", settings.period);
    println!("time:     {}", settings.time);
    if let Some(d) = &settings.day_of_week {
        println!("weekday:  {d}");
    }
    if let Some(d) = settings.month_day {
        println!("monthday: {d}");
    }
    if let Some(n) = settings.n_value {
        println!("n_value:  {n}");
    }
    println!("identity: {}", rule.identity());
}
