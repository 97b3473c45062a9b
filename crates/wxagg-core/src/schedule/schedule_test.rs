use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::*;

fn at(date: &str, hm: &str) -> NaiveDateTime {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let t = NaiveTime::parse_from_str(hm, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(hm, "%H:%M"))
        .unwrap();
    d.and_time(t)
}

fn rule(period: Period, hm: &str) -> RecurrenceRule {
    RecurrenceRule {
        enabled: true,
        period,
        time: NaiveTime::parse_from_str(hm, "%H:%M").unwrap(),
    }
}

#[test]
fn disabled_rule_never_fires() {
    let mut r = rule(Period::Daily, "03:00");
    r.enabled = false;
    for hm in ["00:00", "03:00", "03:02", "12:00", "23:59"] {
        assert_eq!(
            decide(&r, at("2024-05-06", hm), &RunState::default()),
            Decision::Skip(SkipReason::Disabled)
        );
    }
}

#[test]
fn fires_exactly_at_scheduled_time() {
    let r = rule(Period::Daily, "03:00");
    assert_eq!(
        decide(&r, at("2024-05-06", "03:00"), &RunState::default()),
        Decision::Fire
    );
}

#[test]
fn window_is_half_open_five_minutes() {
    let r = rule(Period::Daily, "03:00");
    let state = RunState::default();
    assert_eq!(decide(&r, at("2024-05-06", "03:04:59"), &state), Decision::Fire);
    assert_eq!(
        decide(&r, at("2024-05-06", "03:05"), &state),
        Decision::Skip(SkipReason::OutsideWindow)
    );
    assert_eq!(
        decide(&r, at("2024-05-06", "02:59:59"), &state),
        Decision::Skip(SkipReason::OutsideWindow)
    );
}

#[test]
fn window_crossing_midnight_is_truncated() {
    let r = rule(Period::Daily, "23:57");
    let state = RunState::default();
    assert_eq!(decide(&r, at("2024-05-06", "23:59:59"), &state), Decision::Fire);
    assert_eq!(
        decide(&r, at("2024-05-07", "00:01"), &state),
        Decision::Skip(SkipReason::OutsideWindow)
    );
}

#[test]
fn weekly_uses_iso_weekday() {
    // 2024-05-06 is a Monday, 2024-05-12 a Sunday.
    let monday = rule(Period::Weekly { day_of_week: 1 }, "03:00");
    let sunday = rule(Period::Weekly { day_of_week: 7 }, "03:00");
    let state = RunState::default();
    assert_eq!(decide(&monday, at("2024-05-06", "03:01"), &state), Decision::Fire);
    assert_eq!(
        decide(&monday, at("2024-05-07", "03:01"), &state),
        Decision::Skip(SkipReason::PeriodNotDue)
    );
    assert_eq!(decide(&sunday, at("2024-05-12", "03:01"), &state), Decision::Fire);
}

#[test]
fn monthly_matches_day_of_month() {
    let r = rule(Period::Monthly { day_of_month: 15 }, "08:30");
    let state = RunState::default();
    assert_eq!(decide(&r, at("2024-02-15", "08:30"), &state), Decision::Fire);
    assert_eq!(
        decide(&r, at("2024-02-16", "08:30"), &state),
        Decision::Skip(SkipReason::PeriodNotDue)
    );
}

#[test]
fn every_n_days_first_run_always_fires() {
    let r = rule(Period::EveryNDays { n: 3 }, "03:00");
    assert_eq!(
        decide(&r, at("2024-05-06", "03:00"), &RunState::default()),
        Decision::Fire
    );
}

#[test]
fn every_n_days_fires_iff_enough_days_elapsed() {
    let r = rule(Period::EveryNDays { n: 3 }, "03:00");
    let last = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
    let state = RunState {
        last_fire_date: Some(last),
        last_fired_at: None,
    };
    for (date, expected) in [
        ("2024-05-07", false),
        ("2024-05-08", false),
        ("2024-05-09", true),
        ("2024-05-20", true),
    ] {
        let fired = decide(&r, at(date, "03:00"), &state) == Decision::Fire;
        assert_eq!(fired, expected, "date {date}");
    }
}

#[test]
fn every_n_days_treats_zero_as_one() {
    let r = rule(Period::EveryNDays { n: 0 }, "03:00");
    let state = RunState {
        last_fire_date: NaiveDate::from_ymd_opt(2024, 5, 6),
        last_fired_at: None,
    };
    assert_eq!(
        decide(&r, at("2024-05-06", "03:00"), &state),
        Decision::Skip(SkipReason::PeriodNotDue)
    );
    assert_eq!(decide(&r, at("2024-05-07", "03:00"), &state), Decision::Fire);
}

#[test]
fn already_fired_in_same_window_skips() {
    let r = rule(Period::Daily, "03:00");
    let state = RunState {
        last_fire_date: None,
        last_fired_at: Some(at("2024-05-06", "03:00:10")),
    };
    assert_eq!(
        decide(&r, at("2024-05-06", "03:03"), &state),
        Decision::Skip(SkipReason::AlreadyFired)
    );
    // Previous day's fire does not block today.
    assert_eq!(decide(&r, at("2024-05-07", "03:03"), &state), Decision::Fire);
}

#[test]
fn identity_includes_day_selector() {
    assert_eq!(
        rule(Period::Weekly { day_of_week: 1 }, "03:00").identity().as_str(),
        "weekly@03:00_day1"
    );
    assert_eq!(
        rule(Period::Monthly { day_of_month: 28 }, "22:15")
            .identity()
            .as_str(),
        "monthly@22:15_date28"
    );
    assert_eq!(
        rule(Period::EveryNDays { n: 2 }, "03:00").identity().as_str(),
        "n_days@03:00"
    );
}

#[test]
fn identity_file_stem_is_sanitized() {
    let id = rule(Period::Weekly { day_of_week: 3 }, "03:00").identity();
    assert_eq!(id.file_stem(), "weekly_03_00_day3");
}

#[test]
fn skip_reason_messages() {
    assert_eq!(SkipReason::OutsideWindow.to_string(), "outside time window");
    assert_eq!(
        SkipReason::AlreadyFired.to_string(),
        "already fired this window"
    );
}

#[test]
fn window_crossing_the_hour_is_one_bucket() {
    let r = rule(Period::Daily, "03:58");
    let state = RunState {
        last_fire_date: None,
        last_fired_at: Some(at("2024-05-06", "03:58")),
    };
    assert_eq!(
        decide(&r, at("2024-05-06", "04:00"), &state),
        Decision::Skip(SkipReason::AlreadyFired)
    );
    assert_eq!(
        window_start(&r, at("2024-05-06", "04:02")),
        at("2024-05-06", "03:58")
    );
}
