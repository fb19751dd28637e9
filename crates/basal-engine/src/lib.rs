//! # basal-engine
//!
//! Reconstructs the basal insulin a patient actually received, expressed as
//! deviations from their daily basal profile.
//!
//! Raw temporary-basal commands are reconciled against a 24-hour schedule in
//! three steps: commands are truncated where a later command replaced them,
//! the schedule is rotated from the profile's timezone into UTC, and each
//! command is split at every schedule boundary it crosses.
//!
//! ## Modules
//!
//! - [`command`] — basal commands and truncation of superseded commands
//! - [`schedule`] — daily schedules and rotation onto the UTC wheel
//! - [`zone`] — timezone name → UTC offset
//! - [`profile`] — local-time profiles
//! - [`segment`] — splitting a command along schedule boundaries
//! - [`reconcile`] — the end-to-end pipeline
//! - [`error`] — Error types

pub mod command;
pub mod error;
pub mod profile;
pub mod reconcile;
pub mod schedule;
pub mod segment;
pub mod zone;

pub use command::{normalize_commands, BasalCommand};
pub use error::BasalError;
pub use profile::Profile;
pub use reconcile::{reconcile, reconcile_profile};
pub use schedule::{normalize_schedule, DailySchedule, ScheduleSegment};
pub use segment::{net_delta_units, segment_command, DeliverySegment};
pub use zone::{utc_offset_minutes, OffsetPolicy};
