//! The full pipeline: normalize commands, then segment each against the schedule.

use crate::command::{normalize_commands, BasalCommand};
use crate::error::Result;
use crate::profile::Profile;
use crate::schedule::DailySchedule;
use crate::segment::{segment_command, DeliverySegment};
use crate::zone::OffsetPolicy;

/// Reconstruct the delivered basal as deviations from `schedule`.
///
/// Commands are first cut short where a later command superseded them, then
/// split along the schedule's boundaries. Segments come out in command order,
/// and zero-length commands (typically cancellations) contribute nothing.
///
/// # Errors
/// Returns `BasalError::Ordering` if `commands` is not sorted by start time.
pub fn reconcile(
    commands: &[BasalCommand],
    schedule: &DailySchedule,
) -> Result<Vec<DeliverySegment>> {
    let normalized = normalize_commands(commands)?;

    let segments: Vec<DeliverySegment> = normalized
        .iter()
        .flat_map(|command| segment_command(command, schedule))
        .collect();

    tracing::debug!(
        commands = commands.len(),
        segments = segments.len(),
        "reconciled basal commands"
    );

    Ok(segments)
}

/// Like [`reconcile`], converting a local-time profile to UTC first.
///
/// # Errors
/// Returns the errors of [`Profile::to_utc`] and [`reconcile`].
pub fn reconcile_profile(
    commands: &[BasalCommand],
    profile: &Profile,
    policy: OffsetPolicy,
) -> Result<Vec<DeliverySegment>> {
    let schedule = profile.to_utc(policy)?;
    reconcile(commands, &schedule)
}
