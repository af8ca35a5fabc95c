//! Handing out and passing on granted skills.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use covenant_domain::{
    ActivityEntry, ActivityLog, GrantedSkill, GrantedSkillId, PolicyViolation, ProfileId,
    ReusePolicy, SkillEffects, SkillId,
};

use crate::infrastructure::ports::{
    ActivityLogRepo, ClockPort, GrantedSkillRepo, ProfileRepo, SkillRepo, TransitionOutcome,
};
use crate::use_cases::shared::{load_profile, record_activity, require_staff};
use crate::use_cases::UseCaseError;

#[derive(Debug, Clone)]
pub struct GrantSkillInput {
    pub actor_id: ProfileId,
    pub player_id: ProfileId,
    pub skill_id: SkillId,
    pub title: String,
    pub detail: Option<String>,
    pub reuse_policy: ReusePolicy,
    pub effects: SkillEffects,
    pub expires_at: Option<DateTime<Utc>>,
    pub transferable: bool,
}

/// Staff gives a player their own instance of a skill.
pub struct GrantSkill {
    granted: Arc<dyn GrantedSkillRepo>,
    skills: Arc<dyn SkillRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl GrantSkill {
    pub fn new(
        granted: Arc<dyn GrantedSkillRepo>,
        skills: Arc<dyn SkillRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            granted,
            skills,
            profiles,
            activity,
            clock,
        }
    }

    pub async fn execute(&self, input: GrantSkillInput) -> Result<GrantedSkill, UseCaseError> {
        require_staff(self.profiles.as_ref(), input.actor_id).await?;
        load_profile(self.profiles.as_ref(), input.player_id).await?;
        let skill = self
            .skills
            .get(input.skill_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Skill", input.skill_id))?;

        let now = self.clock.now();
        let mut grant = GrantedSkill::new(
            input.player_id,
            skill.id,
            input.actor_id,
            input.title,
            input.reuse_policy,
            input.effects,
            now,
        )?
        .with_transferable(input.transferable);
        if let Some(detail) = input.detail {
            grant = grant.with_detail(detail);
        }
        if let Some(expires_at) = input.expires_at {
            grant = grant.with_expiry(expires_at);
        }

        self.granted.save(&grant).await?;
        tracing::info!(
            grant_id = %grant.id(),
            player_id = %input.player_id,
            skill_id = %skill.id,
            "Skill granted"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                input.player_id,
                Some(input.actor_id),
                ActivityEntry::SkillGranted {
                    granted_skill_id: grant.id(),
                    skill_id: skill.id,
                    title: grant.title().to_string(),
                },
                now,
            ),
        )
        .await;

        Ok(grant)
    }
}

/// Owner hands a transferable grant to another player.
pub struct TransferGrantedSkill {
    granted: Arc<dyn GrantedSkillRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl TransferGrantedSkill {
    pub fn new(
        granted: Arc<dyn GrantedSkillRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            granted,
            profiles,
            activity,
            clock,
        }
    }

    pub async fn execute(
        &self,
        owner_id: ProfileId,
        grant_id: GrantedSkillId,
        target_id: ProfileId,
    ) -> Result<GrantedSkill, UseCaseError> {
        if owner_id == target_id {
            return Err(UseCaseError::validation(
                "cannot transfer a skill to yourself",
            ));
        }

        let mut grant = self
            .granted
            .get(grant_id)
            .await?
            .filter(|g| g.player_id() == owner_id)
            .ok_or_else(|| UseCaseError::not_found("Granted skill", grant_id))?;
        grant.check_active(self.clock.now())?;
        if !grant.is_transferable() {
            return Err(PolicyViolation::GrantNotTransferable.into());
        }
        load_profile(self.profiles.as_ref(), target_id).await?;

        let expected_times_used = grant.times_used();
        grant.transfer_to(target_id)?;
        let outcome = self
            .granted
            .commit_transfer(&grant, owner_id, expected_times_used)
            .await?;
        if outcome == TransitionOutcome::AlreadyResolved {
            tracing::info!(grant_id = %grant_id, "Transfer lost a race with a cast or transfer");
            return Err(UseCaseError::already_resolved(format!(
                "granted skill {grant_id} changed while transferring"
            )));
        }
        tracing::info!(
            grant_id = %grant_id,
            from = %owner_id,
            to = %target_id,
            "Granted skill transferred"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                target_id,
                Some(owner_id),
                ActivityEntry::SkillTransferred {
                    granted_skill_id: grant_id,
                    from: owner_id,
                    to: target_id,
                },
                self.clock.now(),
            ),
        )
        .await;

        Ok(grant)
    }
}
