//! Punishment coordinator.
//!
//! Staff assign a penalty contract with required tasks. Each assigned player
//! either completes the tasks and requests mercy, or has the penalty applied
//! (by staff, or by the expiry sweep). The two outcomes are exclusive and the
//! store enforces that with a conditional write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use covenant_domain::{
    ActivityEntry, ActivityLog, EventMode, Notification, NotificationKind, PolicyViolation,
    Profile, ProfileId, Punishment, PunishmentId, PunishmentPlayer,
    RequiredTask, ResourceDelta,
};

mod admin;

pub use admin::{ArchivePunishment, UpdatePunishment};

use super::shared::{load_profile, notify, record_activity, require_staff};
use super::UseCaseError;
use crate::infrastructure::ports::{
    ActivityLogRepo, ClockPort, CodeRepo, NotificationPort, ProfileRepo, PunishmentRepo,
    SubmissionRepo, TransitionOutcome,
};

/// Container for punishment use cases.
pub struct PunishmentUseCases {
    pub assign: Arc<AssignPunishment>,
    pub check_completion: Arc<CheckCompletion>,
    pub request_mercy: Arc<RequestMercy>,
    pub apply_penalty: Arc<ApplyPenalty>,
    pub update: Arc<UpdatePunishment>,
    pub archive: Arc<ArchivePunishment>,
}

impl PunishmentUseCases {
    pub fn new(
        assign: Arc<AssignPunishment>,
        check_completion: Arc<CheckCompletion>,
        request_mercy: Arc<RequestMercy>,
        apply_penalty: Arc<ApplyPenalty>,
        update: Arc<UpdatePunishment>,
        archive: Arc<ArchivePunishment>,
    ) -> Self {
        Self {
            assign,
            check_completion,
            request_mercy,
            apply_penalty,
            update,
            archive,
        }
    }
}

async fn load_punishment(
    repo: &dyn PunishmentRepo,
    id: PunishmentId,
) -> Result<Punishment, UseCaseError> {
    repo.get(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("Punishment", id))
}

async fn load_assignment(
    repo: &dyn PunishmentRepo,
    id: PunishmentId,
    player: ProfileId,
) -> Result<PunishmentPlayer, UseCaseError> {
    repo.get_player(id, player)
        .await?
        .ok_or_else(|| UseCaseError::not_found("Punishment assignment", format!("{id}/{player}")))
}

fn already_settled(row: &PunishmentPlayer) -> UseCaseError {
    UseCaseError::already_resolved(format!(
        "punishment {} is already settled for player {}",
        row.punishment_id(),
        row.player_id()
    ))
}

// =============================================================================
// Assign
// =============================================================================

#[derive(Debug, Clone)]
pub struct AssignPunishmentInput {
    pub actor_id: ProfileId,
    pub name: String,
    pub description: Option<String>,
    pub tasks: Vec<RequiredTask>,
    pub players: Vec<ProfileId>,
    /// Non-negative magnitudes
    pub penalty: ResourceDelta,
    pub deadline: Option<DateTime<Utc>>,
    pub mode: EventMode,
}

pub struct AssignPunishment {
    punishments: Arc<dyn PunishmentRepo>,
    codes: Arc<dyn CodeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl AssignPunishment {
    pub fn new(
        punishments: Arc<dyn PunishmentRepo>,
        codes: Arc<dyn CodeRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            punishments,
            codes,
            profiles,
            activity,
            clock,
        }
    }

    pub async fn execute(&self, input: AssignPunishmentInput) -> Result<Punishment, UseCaseError> {
        require_staff(self.profiles.as_ref(), input.actor_id).await?;

        let mut players = input.players;
        players.sort_by_key(|p| p.to_uuid());
        players.dedup();
        if players.is_empty() {
            return Err(UseCaseError::validation("at least one player is required"));
        }

        for task in &input.tasks {
            let matches = self
                .codes
                .get(task.code_id)
                .await?
                .is_some_and(|c| c.kind() == task.kind);
            if !matches {
                return Err(UseCaseError::not_found("Code", task.code_id));
            }
        }
        for player in &players {
            load_profile(self.profiles.as_ref(), *player).await?;
        }

        let now = self.clock.now();
        let mut punishment = Punishment::new(
            input.name,
            input.tasks,
            input.penalty,
            input.mode,
            input.actor_id,
            now,
        )?;
        if let Some(description) = input.description {
            punishment = punishment.with_description(description);
        }
        if let Some(deadline) = input.deadline {
            punishment = punishment.with_deadline(deadline);
        }

        let rows: Vec<PunishmentPlayer> = players
            .iter()
            .map(|p| PunishmentPlayer::new(punishment.id(), *p))
            .collect();
        self.punishments.insert(&punishment, &rows).await?;
        tracing::info!(
            punishment_id = %punishment.id(),
            players = rows.len(),
            "Punishment assigned"
        );

        for player in players {
            record_activity(
                self.activity.as_ref(),
                ActivityLog::new(
                    player,
                    Some(input.actor_id),
                    ActivityEntry::PunishmentAssigned {
                        punishment_id: punishment.id(),
                    },
                    now,
                ),
            )
            .await;
        }

        Ok(punishment)
    }
}

// =============================================================================
// Completion
// =============================================================================

/// Whether every required task has an approved submission since assignment.
pub struct CheckCompletion {
    punishments: Arc<dyn PunishmentRepo>,
    submissions: Arc<dyn SubmissionRepo>,
}

impl CheckCompletion {
    pub fn new(punishments: Arc<dyn PunishmentRepo>, submissions: Arc<dyn SubmissionRepo>) -> Self {
        Self {
            punishments,
            submissions,
        }
    }

    pub async fn execute(
        &self,
        punishment_id: PunishmentId,
        player_id: ProfileId,
    ) -> Result<bool, UseCaseError> {
        let punishment = load_punishment(self.punishments.as_ref(), punishment_id).await?;
        load_assignment(self.punishments.as_ref(), punishment_id, player_id).await?;
        self.is_complete(&punishment, player_id).await
    }

    pub(crate) async fn is_complete(
        &self,
        punishment: &Punishment,
        player_id: ProfileId,
    ) -> Result<bool, UseCaseError> {
        let assigned = if punishment.mode().is_shared() {
            self.punishments.list_players(punishment.id()).await?
        } else {
            Vec::new()
        };
        let pool = punishment.completion_pool(player_id, &assigned);

        for task in punishment.tasks() {
            let done = self
                .submissions
                .has_approved_since(&pool, task.code_id, punishment.created_at())
                .await?;
            if !done {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// =============================================================================
// Mercy
// =============================================================================

pub struct RequestMercy {
    punishments: Arc<dyn PunishmentRepo>,
    completion: Arc<CheckCompletion>,
    activity: Arc<dyn ActivityLogRepo>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
}

impl RequestMercy {
    pub fn new(
        punishments: Arc<dyn PunishmentRepo>,
        completion: Arc<CheckCompletion>,
        activity: Arc<dyn ActivityLogRepo>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            punishments,
            completion,
            activity,
            notifier,
            clock,
        }
    }

    pub async fn execute(
        &self,
        punishment_id: PunishmentId,
        player_id: ProfileId,
    ) -> Result<PunishmentPlayer, UseCaseError> {
        let punishment = load_punishment(self.punishments.as_ref(), punishment_id).await?;
        let mut row = load_assignment(self.punishments.as_ref(), punishment_id, player_id).await?;
        if row.is_settled() {
            return Err(already_settled(&row));
        }
        if !self.completion.is_complete(&punishment, player_id).await? {
            tracing::debug!(
                punishment_id = %punishment_id,
                player_id = %player_id,
                "Mercy refused, tasks incomplete"
            );
            return Err(PolicyViolation::MercyBeforeCompletion.into());
        }

        let now = self.clock.now();
        row.grant_mercy(now)?;
        if let TransitionOutcome::AlreadyResolved = self.punishments.settle_player(&row).await? {
            tracing::info!(
                punishment_id = %punishment_id,
                player_id = %player_id,
                "Mercy lost a race"
            );
            return Err(already_settled(&row));
        }
        tracing::info!(punishment_id = %punishment_id, player_id = %player_id, "Mercy granted");

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                Some(player_id),
                ActivityEntry::MercyRequested { punishment_id },
                now,
            ),
        )
        .await;
        notify(
            self.notifier.as_ref(),
            Notification::new(
                player_id,
                Some(player_id),
                NotificationKind::PunishmentMercy,
                "Mercy granted",
                format!("Your punishment \"{}\" has been lifted.", punishment.name()),
                now,
            ),
        )
        .await;

        Ok(row)
    }
}

// =============================================================================
// Penalty
// =============================================================================

#[derive(Debug, Clone)]
pub struct PenaltyOutcome {
    pub row: PunishmentPlayer,
    pub profile: Profile,
}

pub struct ApplyPenalty {
    punishments: Arc<dyn PunishmentRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
}

impl ApplyPenalty {
    pub fn new(
        punishments: Arc<dyn PunishmentRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            punishments,
            profiles,
            activity,
            notifier,
            clock,
        }
    }

    /// Staff applies the penalty by hand.
    pub async fn execute(
        &self,
        actor_id: ProfileId,
        punishment_id: PunishmentId,
        player_id: ProfileId,
    ) -> Result<PenaltyOutcome, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let punishment = load_punishment(self.punishments.as_ref(), punishment_id).await?;
        self.apply(&punishment, player_id, Some(actor_id)).await
    }

    /// The expiry sweep's entry point; no actor.
    pub async fn apply_automatically(
        &self,
        punishment: &Punishment,
        player_id: ProfileId,
    ) -> Result<PenaltyOutcome, UseCaseError> {
        self.apply(punishment, player_id, None).await
    }

    async fn apply(
        &self,
        punishment: &Punishment,
        player_id: ProfileId,
        actor: Option<ProfileId>,
    ) -> Result<PenaltyOutcome, UseCaseError> {
        let mut row =
            load_assignment(self.punishments.as_ref(), punishment.id(), player_id).await?;
        if row.is_settled() {
            return Err(already_settled(&row));
        }
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;

        let now = self.clock.now();
        row.apply_penalty(now)?;
        let change = profile.apply_delta(&punishment.penalty_delta());
        if let TransitionOutcome::AlreadyResolved = self
            .punishments
            .settle_player_with_profile(&row, &profile)
            .await?
        {
            tracing::info!(
                punishment_id = %punishment.id(),
                player_id = %player_id,
                "Penalty lost a race"
            );
            return Err(already_settled(&row));
        }
        tracing::info!(
            punishment_id = %punishment.id(),
            player_id = %player_id,
            auto = actor.is_none(),
            sanity = change.after.sanity(),
            "Penalty applied"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                actor,
                ActivityEntry::PenaltyApplied {
                    punishment_id: punishment.id(),
                    penalty: *punishment.penalty(),
                    auto: actor.is_none(),
                },
                now,
            ),
        )
        .await;
        notify(
            self.notifier.as_ref(),
            Notification::new(
                player_id,
                actor,
                NotificationKind::PunishmentPenalty,
                "Penalty applied",
                format!("The penalty for \"{}\" has been applied.", punishment.name()),
                now,
            ),
        )
        .await;

        Ok(PenaltyOutcome { row, profile })
    }
}
