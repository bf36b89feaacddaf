use crate::config::PollPolicy;
use crate::error::{CopyPhase, StudioError};
use crate::gateway::{Activity, ActivitySide, Gateway, WorkspaceSettings};
use std::thread;
use tokio_util::sync::CancellationToken;

/// Re-polls `activity` until it reports complete.
///
/// Returns the completed activity and the number of status requests issued.
/// The delay from `policy` is slept before every request, and cancellation is
/// checked both before and after that delay.
pub(crate) fn poll_until_complete<G: Gateway>(
    gateway: &G,
    scope: &WorkspaceSettings,
    mut activity: Activity,
    side: ActivitySide,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    experiment_id: &str,
) -> Result<(Activity, u32), StudioError> {
    let phase = if side.is_source() {
        CopyPhase::Pack
    } else {
        CopyPhase::Unpack
    };
    let mut attempts = 0;

    while !activity.is_complete() {
        if cancel.is_cancelled() {
            return Err(StudioError::Cancelled(experiment_id.to_string()));
        }
        if attempts >= policy.max_attempts {
            return Err(StudioError::CopyTimeout {
                phase,
                activity_id: activity.activity_id,
                attempts,
            });
        }
        if !policy.interval().is_zero() {
            thread::sleep(policy.interval());
            if cancel.is_cancelled() {
                return Err(StudioError::Cancelled(experiment_id.to_string()));
            }
        }

        activity = gateway.get_activity_status(scope, &activity.activity_id, side)?;
        attempts += 1;
        log::debug!(
            "{} activity '{}' reported '{}' (poll {})",
            phase,
            activity.activity_id,
            activity.status,
            attempts
        );
    }

    Ok((activity, attempts))
}
