//! End-to-end tests for the reconciliation pipeline.

use basal_engine::{
    reconcile, reconcile_profile, BasalCommand, BasalError, DailySchedule, OffsetPolicy, Profile,
    ScheduleSegment,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

const EPSILON: f64 = 1e-12;

fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
}

fn two_rate_schedule(rate_a: f64, rate_b: f64) -> DailySchedule {
    DailySchedule::new(vec![
        ScheduleSegment::new(0, rate_a).unwrap(),
        ScheduleSegment::new(30, rate_b).unwrap(),
    ])
    .unwrap()
}

#[test]
fn back_to_back_commands_split_at_the_schedule_boundary() {
    let (rate_a, rate_b) = (0.35, 0.85);
    let schedule = two_rate_schedule(rate_a, rate_b);
    let commands = vec![
        BasalCommand::new(at_minute(0), 1.2, 20.0),
        BasalCommand::new(at_minute(20), 3.1, 20.0),
        BasalCommand::new(at_minute(40), 0.4, 20.0),
    ];

    let segments = reconcile(&commands, &schedule).unwrap();

    assert_eq!(segments.len(), 4);

    assert_eq!(segments[0].start, at_minute(0));
    assert_eq!(segments[0].duration_minutes, 20.0);
    assert!((segments[0].delta_rate_per_minute - (1.2 / 20.0 - rate_a / 60.0)).abs() < EPSILON);

    assert_eq!(segments[1].start, at_minute(20));
    assert_eq!(segments[1].duration_minutes, 10.0);
    assert!((segments[1].delta_rate_per_minute - (3.1 / 20.0 - rate_a / 60.0)).abs() < EPSILON);

    assert_eq!(segments[2].start, at_minute(30));
    assert_eq!(segments[2].duration_minutes, 10.0);
    assert!((segments[2].delta_rate_per_minute - (3.1 / 20.0 - rate_b / 60.0)).abs() < EPSILON);

    assert_eq!(segments[3].start, at_minute(40));
    assert_eq!(segments[3].duration_minutes, 20.0);
    assert!((segments[3].delta_rate_per_minute - (0.4 / 20.0 - rate_b / 60.0)).abs() < EPSILON);
}

#[test]
fn superseded_commands_are_truncated_before_splitting() {
    let schedule = DailySchedule::flat(0.6);
    let commands = vec![
        BasalCommand::new(at_minute(720), 0.4 * 30.0 / 60.0, 30.0),
        BasalCommand::new(at_minute(750), 0.0, 0.0),
        BasalCommand::new(at_minute(780), 0.8 * 15.0 / 60.0, 15.0),
        BasalCommand::new(at_minute(810), 1.35 * 20.0 / 60.0, 20.0),
    ];

    let segments = reconcile(&commands, &schedule).unwrap();

    // The zero-length cancellation contributes nothing.
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].start, at_minute(720));
    assert_eq!(segments[1].start, at_minute(780));
    assert_eq!(segments[2].start, at_minute(810));
    assert!((segments[0].delta_rate_per_minute - (0.4 - 0.6) / 60.0).abs() < EPSILON);
    assert!((segments[1].delta_rate_per_minute - (0.8 - 0.6) / 60.0).abs() < EPSILON);
    assert!((segments[2].delta_rate_per_minute - (1.35 - 0.6) / 60.0).abs() < EPSILON);
}

#[test]
fn overlapping_commands_do_not_double_count() {
    let schedule = two_rate_schedule(0.5, 1.0);
    let commands = vec![
        BasalCommand::new(at_minute(0), 6.0, 120.0),
        BasalCommand::new(at_minute(45), 1.0, 60.0),
    ];

    let segments = reconcile(&commands, &schedule).unwrap();

    let covered: f64 = segments.iter().map(|s| s.duration_minutes).sum();
    assert!((covered - 105.0).abs() < EPSILON);
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), Some(pair[1].start));
    }
}

#[test]
fn unsorted_commands_fail() {
    let schedule = DailySchedule::flat(1.0);
    let commands = vec![
        BasalCommand::new(at_minute(60), 1.0, 30.0),
        BasalCommand::new(at_minute(0), 1.0, 30.0),
    ];

    assert_eq!(
        reconcile(&commands, &schedule).unwrap_err(),
        BasalError::Ordering { index: 1 }
    );
}

#[test]
fn no_commands_no_segments() {
    assert!(reconcile(&[], &DailySchedule::flat(1.0)).unwrap().is_empty());
}

#[test]
fn local_profile_is_rotated_before_reconciling() {
    // 06:00 local in GMT+2 is 04:00 UTC.
    let profile = Profile::new(
        "GMT+2",
        vec![
            ScheduleSegment::parse("00:00", 0.6).unwrap(),
            ScheduleSegment::parse("06:00", 1.2).unwrap(),
        ],
    );
    let commands = vec![BasalCommand::new(at_minute(210), 0.0, 60.0)];

    let segments = reconcile_profile(&commands, &profile, OffsetPolicy::Epoch).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start, at_minute(210));
    assert_eq!(segments[0].duration_minutes, 30.0);
    assert!((segments[0].delta_rate_per_minute + 0.6 / 60.0).abs() < EPSILON);
    assert_eq!(segments[1].start, at_minute(240));
    assert_eq!(segments[1].duration_minutes, 30.0);
    assert!((segments[1].delta_rate_per_minute + 1.2 / 60.0).abs() < EPSILON);
}

#[test]
fn profile_without_basal_fails() {
    let profile = Profile::new("UTC", vec![]);
    let commands = vec![BasalCommand::new(at_minute(0), 1.0, 30.0)];

    assert_eq!(
        reconcile_profile(&commands, &profile, OffsetPolicy::Epoch).unwrap_err(),
        BasalError::EmptySchedule
    );
}

#[test]
fn segments_serialize() {
    let segments = reconcile(
        &[BasalCommand::new(at_minute(0), 1.0, 30.0)],
        &DailySchedule::flat(1.2),
    )
    .unwrap();

    let json = serde_json::to_value(&segments).unwrap();
    assert_eq!(json[0]["duration_minutes"], 30.0);
    assert_eq!(json[0]["start"], "1970-01-01T00:00:00Z");
}
