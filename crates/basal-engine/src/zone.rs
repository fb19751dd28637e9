//! Resolve a profile's timezone to the fixed offset used to rotate its schedule.

use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BasalError, Result};

/// Which instant to sample a zone's UTC offset at.
///
/// A daily schedule is rotated by one fixed offset, so zones with daylight
/// saving time have to commit to one side of the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OffsetPolicy {
    /// The offset in force at the Unix epoch.
    #[default]
    Epoch,
    /// The offset in force at a chosen instant, e.g. the start of the data window.
    At(DateTime<Utc>),
}

impl OffsetPolicy {
    fn instant(self) -> DateTime<Utc> {
        match self {
            OffsetPolicy::Epoch => DateTime::<Utc>::UNIX_EPOCH,
            OffsetPolicy::At(instant) => instant,
        }
    }
}

/// UTC offset of `timezone` in minutes, east of Greenwich positive.
///
/// Accepts IANA names (`"Europe/Berlin"`, `"Zulu"`) as well as fixed offsets
/// written `"GMT+3"`, `"UTC-04:30"` or `"+05:45"`.
///
/// # Errors
/// Returns `BasalError::InvalidTimezone` if the name is neither.
pub fn utc_offset_minutes(timezone: &str, policy: OffsetPolicy) -> Result<i32> {
    if let Some(minutes) = parse_fixed_offset(timezone) {
        return Ok(minutes);
    }

    let tz: Tz = timezone
        .parse()
        .map_err(|_| BasalError::InvalidTimezone(timezone.to_string()))?;
    let offset = tz
        .offset_from_utc_datetime(&policy.instant().naive_utc())
        .fix();

    Ok(offset.local_minus_utc() / 60)
}

/// Minutes to add to a local time of day to get the UTC time of day.
pub fn wheel_shift_minutes(utc_offset_minutes: i32) -> i32 {
    -utc_offset_minutes
}

fn parse_fixed_offset(name: &str) -> Option<i32> {
    let rest = name
        .strip_prefix("GMT")
        .or_else(|| name.strip_prefix("UTC"))
        .unwrap_or(name);

    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    Some(sign * (hours * 60 + minutes))
}
