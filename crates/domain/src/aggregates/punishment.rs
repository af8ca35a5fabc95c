//! Punishment aggregate - a penalty contract with required follow-up tasks.
//!
//! Each assigned player has a [`PunishmentPlayer`] row that ends in exactly one
//! of two terminal states: mercy granted or penalty applied. Persisting either
//! transition must be conditional on both flags still being unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ResourceDelta;
use crate::{CodeId, CodeKind, DomainError, PolicyViolation, ProfileId, PunishmentId};

/// How completion is shared among assigned players in group mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Every member completes every task personally.
    Group,
    /// Any member completing a task completes it for everyone.
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventMode", content = "groupMode", rename_all = "lowercase")]
pub enum EventMode {
    Individual,
    Group(GroupMode),
}

impl EventMode {
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Group(GroupMode::Shared))
    }
}

/// A task the punished player must complete: an approved submission against this code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredTask {
    pub kind: CodeKind,
    pub code_id: CodeId,
}

/// Editable fields of a punishment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PunishmentChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub penalty: Option<ResourceDelta>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Punishment {
    id: PunishmentId,
    name: String,
    description: Option<String>,
    tasks: Vec<RequiredTask>,
    /// Non-negative magnitudes; applied as reductions.
    penalty: ResourceDelta,
    deadline: Option<DateTime<Utc>>,
    mode: EventMode,
    is_active: bool,
    archived: bool,
    created_by: ProfileId,
    created_at: DateTime<Utc>,
}

impl Punishment {
    pub fn new(
        name: impl Into<String>,
        tasks: Vec<RequiredTask>,
        penalty: ResourceDelta,
        mode: EventMode,
        created_by: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Punishment name cannot be empty"));
        }
        if tasks.is_empty() {
            return Err(DomainError::validation(
                "Punishment needs at least one required task",
            ));
        }
        let penalty = penalty.ensure_non_negative("Penalty")?;

        Ok(Self {
            id: PunishmentId::new(),
            name,
            description: None,
            tasks,
            penalty,
            deadline: None,
            mode,
            is_active: true,
            archived: false,
            created_by,
            created_at: now,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PunishmentId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn tasks(&self) -> &[RequiredTask] {
        &self.tasks
    }

    #[inline]
    pub fn penalty(&self) -> &ResourceDelta {
        &self.penalty
    }

    /// The penalty as a ledger delta (negated magnitudes).
    pub fn penalty_delta(&self) -> ResourceDelta {
        self.penalty.negated()
    }

    #[inline]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    #[inline]
    pub fn mode(&self) -> EventMode {
        self.mode
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    #[inline]
    pub fn created_by(&self) -> ProfileId {
        self.created_by
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| d < now)
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================


    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into().trim().to_string();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Players whose approved submissions count toward `player`'s completion.
    ///
    /// Shared group punishments pool every assigned player; every other mode
    /// only counts the player's own work.
    pub fn completion_pool(
        &self,
        player: ProfileId,
        assigned: &[PunishmentPlayer],
    ) -> Vec<ProfileId> {
        if self.mode.is_shared() {
            assigned.iter().map(|p| p.player_id()).collect()
        } else {
            vec![player]
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Applies staff edits. Refused once the current deadline has passed.
    pub fn update(
        &mut self,
        changes: PunishmentChanges,
        now: DateTime<Utc>,
    ) -> Result<(), PunishmentUpdateError> {
        if self.is_past_deadline(now) {
            return Err(PunishmentUpdateError::Policy(PolicyViolation::DeadlinePassed));
        }
        let name = match changes.name.map(|n| n.trim().to_string()) {
            Some(name) if name.is_empty() => {
                return Err(PunishmentUpdateError::Invalid(DomainError::validation(
                    "Punishment name cannot be empty",
                )));
            }
            other => other,
        };
        let penalty = changes
            .penalty
            .map(|p| p.ensure_non_negative("Penalty"))
            .transpose()
            .map_err(PunishmentUpdateError::Invalid)?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(penalty) = penalty {
            self.penalty = penalty;
        }
        if let Some(description) = changes.description {
            let description = description.trim().to_string();
            self.description = (!description.is_empty()).then_some(description);
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = deadline;
        }
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Soft delete; also stops the expiry sweep from touching it.
    pub fn archive(&mut self) {
        self.archived = true;
        self.is_active = false;
    }
}

/// Why a punishment edit was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PunishmentUpdateError {
    #[error(transparent)]
    Policy(PolicyViolation),
    #[error(transparent)]
    Invalid(DomainError),
}

/// One assigned player's standing on a punishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunishmentPlayer {
    punishment_id: PunishmentId,
    player_id: ProfileId,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    mercy_requested: bool,
    mercy_requested_at: Option<DateTime<Utc>>,
    penalty_applied: bool,
    penalty_applied_at: Option<DateTime<Utc>>,
}

impl PunishmentPlayer {
    pub fn new(punishment_id: PunishmentId, player_id: ProfileId) -> Self {
        Self {
            punishment_id,
            player_id,
            is_completed: false,
            completed_at: None,
            mercy_requested: false,
            mercy_requested_at: None,
            penalty_applied: false,
            penalty_applied_at: None,
        }
    }

    #[inline]
    pub fn punishment_id(&self) -> PunishmentId {
        self.punishment_id
    }

    #[inline]
    pub fn player_id(&self) -> ProfileId {
        self.player_id
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[inline]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[inline]
    pub fn mercy_requested(&self) -> bool {
        self.mercy_requested
    }

    #[inline]
    pub fn mercy_requested_at(&self) -> Option<DateTime<Utc>> {
        self.mercy_requested_at
    }

    #[inline]
    pub fn penalty_applied(&self) -> bool {
        self.penalty_applied
    }

    #[inline]
    pub fn penalty_applied_at(&self) -> Option<DateTime<Utc>> {
        self.penalty_applied_at
    }

    /// Mercy or penalty already happened; nothing more may run for this player.
    pub fn is_settled(&self) -> bool {
        self.mercy_requested || self.penalty_applied
    }

    pub fn grant_mercy(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_unsettled()?;
        self.mercy_requested = true;
        self.mercy_requested_at = Some(now);
        self.is_completed = true;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn apply_penalty(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_unsettled()?;
        self.penalty_applied = true;
        self.penalty_applied_at = Some(now);
        Ok(())
    }

    fn ensure_unsettled(&self) -> Result<(), DomainError> {
        if self.is_settled() {
            return Err(DomainError::invalid_state_transition(format!(
                "punishment {} is already settled for player {}",
                self.punishment_id, self.player_id
            )));
        }
        Ok(())
    }
}
