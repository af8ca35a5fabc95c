//! Staff edits to an existing punishment.

use std::sync::Arc;

use covenant_domain::{ProfileId, Punishment, PunishmentChanges, PunishmentId};

use super::load_punishment;
use crate::infrastructure::ports::{ClockPort, ProfileRepo, PunishmentRepo};
use crate::use_cases::shared::require_staff;
use crate::use_cases::UseCaseError;

pub struct UpdatePunishment {
    punishments: Arc<dyn PunishmentRepo>,
    profiles: Arc<dyn ProfileRepo>,
    clock: Arc<dyn ClockPort>,
}

impl UpdatePunishment {
    pub fn new(
        punishments: Arc<dyn PunishmentRepo>,
        profiles: Arc<dyn ProfileRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            punishments,
            profiles,
            clock,
        }
    }

    /// Refused once the current deadline has passed.
    pub async fn execute(
        &self,
        actor_id: ProfileId,
        punishment_id: PunishmentId,
        changes: PunishmentChanges,
    ) -> Result<Punishment, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let mut punishment = load_punishment(self.punishments.as_ref(), punishment_id).await?;
        if punishment.is_archived() {
            return Err(UseCaseError::not_found("Punishment", punishment_id));
        }

        punishment.update(changes, self.clock.now())?;
        self.punishments.save(&punishment).await?;
        tracing::info!(punishment_id = %punishment_id, actor_id = %actor_id, "Punishment updated");
        Ok(punishment)
    }
}

pub struct ArchivePunishment {
    punishments: Arc<dyn PunishmentRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl ArchivePunishment {
    pub fn new(punishments: Arc<dyn PunishmentRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self {
            punishments,
            profiles,
        }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        punishment_id: PunishmentId,
    ) -> Result<Punishment, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let mut punishment = load_punishment(self.punishments.as_ref(), punishment_id).await?;
        if punishment.is_archived() {
            return Ok(punishment);
        }

        punishment.archive();
        self.punishments.save(&punishment).await?;
        tracing::info!(punishment_id = %punishment_id, "Punishment archived");
        Ok(punishment)
    }
}
