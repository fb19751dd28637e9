//! Basal profiles: a daily schedule written in the patient's local time.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::{normalize_schedule, DailySchedule, ScheduleSegment};
use crate::zone::{utc_offset_minutes, wheel_shift_minutes, OffsetPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// IANA zone name or fixed offset the `basal` times are written in.
    pub timezone: String,
    pub basal: Vec<ScheduleSegment>,
}

impl Profile {
    pub fn new(timezone: impl Into<String>, basal: Vec<ScheduleSegment>) -> Self {
        Self {
            timezone: timezone.into(),
            basal,
        }
    }

    /// Rotate the profile's schedule into a canonical UTC schedule.
    ///
    /// # Errors
    /// Returns `BasalError::InvalidTimezone` for an unknown zone and
    /// `BasalError::EmptySchedule` for a profile without basal entries.
    pub fn to_utc(&self, policy: OffsetPolicy) -> Result<DailySchedule> {
        let offset = utc_offset_minutes(&self.timezone, policy)?;
        normalize_schedule(&self.basal, wheel_shift_minutes(offset))
    }
}
