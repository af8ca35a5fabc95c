//! Helpers every workflow leans on: loading actors and the fire-and-forget side effects.

use covenant_domain::{ActivityLog, Notification, PolicyViolation, Profile, ProfileId};

use super::UseCaseError;
use crate::infrastructure::ports::{ActivityLogRepo, NotificationPort, ProfileRepo};

pub(crate) async fn load_profile(
    profiles: &dyn ProfileRepo,
    id: ProfileId,
) -> Result<Profile, UseCaseError> {
    profiles
        .get(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("Profile", id))
}

/// Loads the actor and refuses anyone below staff.
pub(crate) async fn require_staff(
    profiles: &dyn ProfileRepo,
    id: ProfileId,
) -> Result<Profile, UseCaseError> {
    let actor = load_profile(profiles, id).await?;
    if !actor.is_staff() {
        tracing::debug!(actor_id = %id, "Staff-only operation refused");
        return Err(PolicyViolation::StaffOnly.into());
    }
    Ok(actor)
}

/// Hands a notification to the dispatcher. Failure is logged, never returned.
pub(crate) async fn notify(port: &dyn NotificationPort, notification: Notification) {
    let target = notification.target;
    let kind = notification.kind;
    if let Err(e) = port.dispatch(notification).await {
        tracing::warn!(
            error = %e,
            target_id = %target,
            kind = %kind,
            "Notification dispatch failed"
        );
    }
}

/// Appends an audit entry. The transition it describes has already committed.
pub(crate) async fn record_activity(log: &dyn ActivityLogRepo, entry: ActivityLog) {
    if let Err(e) = log.append(&entry).await {
        tracing::warn!(
            error = %e,
            player_id = %entry.player_id,
            kind = entry.entry.kind(),
            "Activity log append failed"
        );
    }
}
