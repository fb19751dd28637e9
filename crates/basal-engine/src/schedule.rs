//! Daily basal schedules and the schedule normalizer.
//!
//! A schedule is a 24-hour wheel of rate boundaries. Each boundary's rate holds
//! until the next boundary, and the last boundary's rate wraps past midnight
//! back to the first.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{BasalError, Result};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// One boundary of a daily schedule: from `minute_of_day` on, `rate_per_hour` applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    /// Minutes since midnight, `0..1440`.
    pub minute_of_day: u32,
    /// Units per hour.
    pub rate_per_hour: f64,
}

impl ScheduleSegment {
    /// # Errors
    /// Returns `BasalError::InvalidTimeOfDay` if `minute_of_day` is not below 1440.
    pub fn new(minute_of_day: u32, rate_per_hour: f64) -> Result<Self> {
        if minute_of_day >= MINUTES_PER_DAY {
            return Err(BasalError::InvalidTimeOfDay(format!(
                "minute {} is past the end of the day",
                minute_of_day
            )));
        }
        Ok(Self {
            minute_of_day,
            rate_per_hour,
        })
    }

    /// Build a boundary from a wall-clock time. Seconds are dropped.
    pub fn at(time: NaiveTime, rate_per_hour: f64) -> Self {
        Self {
            minute_of_day: time.hour() * 60 + time.minute(),
            rate_per_hour,
        }
    }

    /// Parse an `HH:MM` (or `HH:MM:SS`) time of day, as profiles store it.
    ///
    /// # Errors
    /// Returns `BasalError::InvalidTimeOfDay` if the string is not a valid time.
    pub fn parse(time: &str, rate_per_hour: f64) -> Result<Self> {
        let parsed = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|e| BasalError::InvalidTimeOfDay(format!("'{}': {}", time, e)))?;
        Ok(Self::at(parsed, rate_per_hour))
    }

    pub fn rate_per_minute(&self) -> f64 {
        self.rate_per_hour / 60.0
    }
}

/// A non-empty, sorted set of schedule boundaries with unique times of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScheduleSegment>", into = "Vec<ScheduleSegment>")]
pub struct DailySchedule {
    segments: Vec<ScheduleSegment>,
}

impl DailySchedule {
    /// Sort the boundaries and validate them.
    ///
    /// # Errors
    /// Returns `BasalError::EmptySchedule` for an empty list,
    /// `BasalError::InvalidTimeOfDay` for a boundary at or past minute 1440, and
    /// `BasalError::DuplicateTimeOfDay` when two boundaries share a minute.
    pub fn new(mut segments: Vec<ScheduleSegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(BasalError::EmptySchedule);
        }
        check_within_day(&segments)?;

        segments.sort_by_key(|s| s.minute_of_day);

        if let Some(pair) = segments
            .windows(2)
            .find(|pair| pair[0].minute_of_day == pair[1].minute_of_day)
        {
            return Err(BasalError::DuplicateTimeOfDay(pair[0].minute_of_day));
        }

        Ok(Self { segments })
    }

    /// A schedule with a single rate around the clock.
    pub fn flat(rate_per_hour: f64) -> Self {
        Self {
            segments: vec![ScheduleSegment {
                minute_of_day: 0,
                rate_per_hour,
            }],
        }
    }

    pub fn segments(&self) -> &[ScheduleSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept alongside [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the boundary in force at `minute_of_day`.
    ///
    /// This is the last boundary at or before the given minute. A minute earlier
    /// than every boundary belongs to the last boundary of the previous day.
    pub fn index_at(&self, minute_of_day: u32) -> usize {
        let after = self
            .segments
            .partition_point(|s| s.minute_of_day <= minute_of_day);
        if after == 0 {
            self.segments.len() - 1
        } else {
            after - 1
        }
    }

    /// Units per hour in force at `minute_of_day`.
    pub fn rate_at(&self, minute_of_day: u32) -> f64 {
        self.segments[self.index_at(minute_of_day)].rate_per_hour
    }

    /// Units delivered by following the schedule for one full day.
    pub fn total_daily_units(&self) -> f64 {
        if self.segments.len() == 1 {
            return self.segments[0].rate_per_hour * 24.0;
        }
        self.segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let next = self.segments[(i + 1) % self.segments.len()].minute_of_day;
                let span = (next + MINUTES_PER_DAY - seg.minute_of_day) % MINUTES_PER_DAY;
                seg.rate_per_hour * f64::from(span) / 60.0
            })
            .sum()
    }

    /// Anchored at midnight with no two consecutive boundaries sharing a rate.
    pub fn is_canonical(&self) -> bool {
        self.segments[0].minute_of_day == 0
            && self
                .segments
                .windows(2)
                .all(|pair| pair[0].rate_per_hour != pair[1].rate_per_hour)
    }
}

impl TryFrom<Vec<ScheduleSegment>> for DailySchedule {
    type Error = BasalError;

    fn try_from(segments: Vec<ScheduleSegment>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<DailySchedule> for Vec<ScheduleSegment> {
    fn from(schedule: DailySchedule) -> Self {
        schedule.segments
    }
}

fn check_within_day(segments: &[ScheduleSegment]) -> Result<()> {
    match segments
        .iter()
        .find(|s| s.minute_of_day >= MINUTES_PER_DAY)
    {
        Some(bad) => Err(BasalError::InvalidTimeOfDay(format!(
            "minute {} is past the end of the day",
            bad.minute_of_day
        ))),
        None => Ok(()),
    }
}

/// Rotate a schedule around the 24-hour wheel into a canonical form.
///
/// `wheel_shift_minutes` is added to every local time of day to obtain the
/// target (usually UTC) time of day, i.e. the negated UTC offset of the source
/// timezone. After shifting, boundaries are re-sorted, a midnight boundary is
/// inserted carrying the rate that was running when the wheel crossed midnight,
/// and runs of boundaries with equal rates collapse into their first boundary.
///
/// The last and first boundaries may still share a rate: the midnight anchor is
/// always kept.
///
/// # Errors
/// Returns `BasalError::EmptySchedule` if `segments` is empty and
/// `BasalError::InvalidTimeOfDay` if any boundary is at or past minute 1440,
/// before any shifting, plus the validation errors of [`DailySchedule::new`].
pub fn normalize_schedule(
    segments: &[ScheduleSegment],
    wheel_shift_minutes: i32,
) -> Result<DailySchedule> {
    if segments.is_empty() {
        return Err(BasalError::EmptySchedule);
    }
    check_within_day(segments)?;

    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|s| s.minute_of_day);

    let day = MINUTES_PER_DAY as i32;
    let mut shifted: Vec<ScheduleSegment> = sorted
        .iter()
        .map(|s| ScheduleSegment {
            minute_of_day: (s.minute_of_day as i32 + wheel_shift_minutes).rem_euclid(day) as u32,
            rate_per_hour: s.rate_per_hour,
        })
        .collect();
    shifted.sort_by_key(|s| s.minute_of_day);

    if shifted[0].minute_of_day != 0 {
        let wrapped_rate = shifted[shifted.len() - 1].rate_per_hour;
        shifted.insert(
            0,
            ScheduleSegment {
                minute_of_day: 0,
                rate_per_hour: wrapped_rate,
            },
        );
    }

    shifted.dedup_by(|later, earlier| later.rate_per_hour == earlier.rate_per_hour);

    tracing::debug!(
        wheel_shift_minutes,
        input_boundaries = segments.len(),
        output_boundaries = shifted.len(),
        "normalized daily schedule"
    );

    DailySchedule::new(shifted)
}
