//! Basal commands and the command normalizer.
//!
//! Pumps routinely replace a temporary basal before it runs out. The normalizer
//! cuts every command short at the start of its successor so that each command
//! describes what was actually active, scaling the quantity so that the
//! per-minute rate stays the same.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BasalError, Result};

/// A constant-rate basal instruction: `quantity` units spread over `duration_minutes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasalCommand {
    pub start: DateTime<Utc>,
    /// Total units the command intends to deliver.
    pub quantity: f64,
    pub duration_minutes: f64,
}

impl BasalCommand {
    pub fn new(start: DateTime<Utc>, quantity: f64, duration_minutes: f64) -> Self {
        Self {
            start,
            quantity,
            duration_minutes,
        }
    }

    /// Units per minute, or `None` for a command that delivers over no time at all.
    pub fn rate_per_minute(&self) -> Option<f64> {
        if self.duration_minutes > 0.0 && self.duration_minutes.is_finite() {
            Some(self.quantity / self.duration_minutes)
        } else {
            None
        }
    }

    /// The instant the command's stated duration runs out, or `None` when the
    /// duration is not finite or the end falls outside the representable range.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.start
            .checked_add_signed(minutes_to_duration(self.duration_minutes)?)
    }

    /// A copy of this command cut down to `minutes`, keeping its rate.
    fn truncated(&self, minutes: f64) -> Self {
        Self {
            start: self.start,
            quantity: self.quantity * minutes / self.duration_minutes,
            duration_minutes: minutes,
        }
    }
}

/// Cut each command short at the start of the next one.
///
/// The gap between two commands is measured in whole minutes (rounded). When it
/// is shorter than the earlier command's duration, that command is replaced by a
/// copy lasting exactly the gap, with `quantity` scaled by `gap / duration`. The
/// last command has no successor and is always passed through unchanged.
///
/// Output has the same length and order as the input.
///
/// # Errors
/// Returns `BasalError::Ordering` if any command starts before its predecessor.
pub fn normalize_commands(commands: &[BasalCommand]) -> Result<Vec<BasalCommand>> {
    if let Some(index) = commands
        .windows(2)
        .position(|pair| pair[1].start < pair[0].start)
    {
        return Err(BasalError::Ordering { index: index + 1 });
    }

    let mut normalized = Vec::with_capacity(commands.len());

    for (index, pair) in commands.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        let gap_minutes = gap_in_minutes(current.start, next.start);

        if gap_minutes < current.duration_minutes {
            tracing::debug!(
                index,
                declared_minutes = current.duration_minutes,
                effective_minutes = gap_minutes,
                "truncating superseded basal command"
            );
            normalized.push(current.truncated(gap_minutes));
        } else {
            normalized.push(current.clone());
        }
    }

    if let Some(last) = commands.last() {
        normalized.push(last.clone());
    }

    Ok(normalized)
}

/// Whole minutes between two instants, rounded half away from zero.
fn gap_in_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 60_000.0).round()
}

/// Convert fractional minutes into a `Duration` at millisecond precision.
pub(crate) fn minutes_to_duration(minutes: f64) -> Option<Duration> {
    if !minutes.is_finite() {
        return None;
    }
    Duration::try_milliseconds((minutes * 60_000.0).round() as i64)
}
