//! The segmentation engine: split a basal command along schedule boundaries.
//!
//! A command runs at one constant rate, but the schedule it is compared against
//! changes rate at each boundary. The command is walked boundary by boundary,
//! wrapping through midnight as often as its duration requires, and each piece
//! records how far the command's rate sat above or below the scheduled rate.
//!
//! The walk runs on integer milliseconds so that boundaries are hit exactly.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::command::{minutes_to_duration, BasalCommand};
use crate::schedule::{DailySchedule, MINUTES_PER_DAY};

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_DAY: i64 = MINUTES_PER_DAY as i64 * MS_PER_MINUTE;

/// A stretch of a command during which the scheduled rate does not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySegment {
    pub start: DateTime<Utc>,
    pub duration_minutes: f64,
    /// Command rate minus scheduled rate, in units per minute.
    pub delta_rate_per_minute: f64,
}

impl DeliverySegment {
    /// `None` when the duration is not finite or the end is out of range.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.start
            .checked_add_signed(minutes_to_duration(self.duration_minutes)?)
    }

    /// Units delivered above (positive) or below (negative) the schedule.
    pub fn delta_units(&self) -> f64 {
        self.delta_rate_per_minute * self.duration_minutes
    }
}

/// Sum of [`DeliverySegment::delta_units`] over all segments.
pub fn net_delta_units(segments: &[DeliverySegment]) -> f64 {
    segments.iter().map(DeliverySegment::delta_units).sum()
}

/// Split `command` at every schedule boundary it crosses.
///
/// The returned segments are contiguous and cover exactly
/// `[command.start, command.end())`. The command's rate is computed once and
/// shared by every segment; only the scheduled rate changes between them. A
/// single-boundary schedule never splits a command.
///
/// A command with zero duration yields no segments. Negative or non-finite
/// durations are skipped the same way.
pub fn segment_command(command: &BasalCommand, schedule: &DailySchedule) -> Vec<DeliverySegment> {
    let Some(rate) = command.rate_per_minute() else {
        if command.duration_minutes != 0.0 {
            tracing::warn!(
                start = %command.start,
                duration_minutes = command.duration_minutes,
                "skipping basal command without a usable duration"
            );
        }
        return Vec::new();
    };

    let total_ms = (command.duration_minutes * MS_PER_MINUTE as f64).round() as i64;
    if total_ms <= 0 {
        return Vec::new();
    }

    let boundaries = schedule.segments();

    if boundaries.len() == 1 {
        return vec![piece(command.start, total_ms, rate, boundaries[0].rate_per_minute())];
    }

    let mut segments = Vec::new();
    let start_of_day_ms = ms_of_day(command.start);
    let mut elapsed_ms = 0;

    while elapsed_ms < total_ms {
        let tod_ms = (start_of_day_ms + elapsed_ms) % MS_PER_DAY;
        let index = schedule.index_at((tod_ms / MS_PER_MINUTE) as u32);
        let next = &boundaries[(index + 1) % boundaries.len()];

        let mut distance_ms = i64::from(next.minute_of_day) * MS_PER_MINUTE - tod_ms;
        if distance_ms <= 0 {
            distance_ms += MS_PER_DAY;
        }
        let length_ms = distance_ms.min(total_ms - elapsed_ms);

        let start = command.start + Duration::milliseconds(elapsed_ms);
        segments.push(piece(start, length_ms, rate, boundaries[index].rate_per_minute()));
        elapsed_ms += length_ms;
    }

    segments
}

fn piece(start: DateTime<Utc>, length_ms: i64, rate: f64, scheduled_rate: f64) -> DeliverySegment {
    let segment = DeliverySegment {
        start,
        duration_minutes: length_ms as f64 / MS_PER_MINUTE as f64,
        delta_rate_per_minute: rate - scheduled_rate,
    };
    tracing::trace!(
        start = %segment.start,
        duration_minutes = segment.duration_minutes,
        delta_rate_per_minute = segment.delta_rate_per_minute,
        "delivery segment"
    );
    segment
}

/// Milliseconds since UTC midnight, truncating sub-millisecond precision.
fn ms_of_day(instant: DateTime<Utc>) -> i64 {
    i64::from(instant.num_seconds_from_midnight()) * 1000
        + i64::from(instant.nanosecond() % 1_000_000_000) / 1_000_000
}
