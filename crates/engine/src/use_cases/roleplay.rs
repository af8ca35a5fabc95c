//! Roleplay review and potion-digest promotion.
//!
//! Players hand in a day's roleplay links; staff grade each link once, and
//! the grade raises the player's digest progress. A full digest buys one
//! sequence step.

use std::sync::Arc;

use covenant_domain::{
    ActivityEntry, ActivityLog, DigestLevel, GameCalendar, PolicyViolation, Profile, ProfileId,
    RoleplayLink, RoleplayLinkId, RoleplaySubmission,
};

use super::shared::{load_profile, record_activity, require_staff};
use super::UseCaseError;
use crate::infrastructure::ports::{
    ActivityLogRepo, ClockPort, ProfileRepo, RoleplayRepo, TransitionOutcome,
};

/// Container for roleplay use cases.
pub struct RoleplayUseCases {
    pub submit: Arc<SubmitRoleplayLinks>,
    pub review: Arc<ReviewRoleplayLink>,
    pub promote: Arc<PromoteSequence>,
}

impl RoleplayUseCases {
    pub fn new(
        submit: Arc<SubmitRoleplayLinks>,
        review: Arc<ReviewRoleplayLink>,
        promote: Arc<PromoteSequence>,
    ) -> Self {
        Self {
            submit,
            review,
            promote,
        }
    }
}

/// One batch of links per player per local day.
pub struct SubmitRoleplayLinks {
    roleplay: Arc<dyn RoleplayRepo>,
    profiles: Arc<dyn ProfileRepo>,
    clock: Arc<dyn ClockPort>,
    calendar: GameCalendar,
}

impl SubmitRoleplayLinks {
    pub fn new(
        roleplay: Arc<dyn RoleplayRepo>,
        profiles: Arc<dyn ProfileRepo>,
        clock: Arc<dyn ClockPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            roleplay,
            profiles,
            clock,
            calendar,
        }
    }

    pub async fn execute(
        &self,
        player_id: ProfileId,
        urls: Vec<String>,
    ) -> Result<RoleplaySubmission, UseCaseError> {
        load_profile(self.profiles.as_ref(), player_id).await?;
        let now = self.clock.now();
        let today = now.with_timezone(&self.calendar.offset()).date_naive();
        let submission = RoleplaySubmission::new(player_id, &urls, today, now)?;

        if self.roleplay.exists_for_day(player_id, today).await? {
            return Err(PolicyViolation::RoleplayAlreadySubmittedToday.into());
        }
        match self.roleplay.insert(&submission).await {
            Ok(()) => {}
            // Lost a same-day race; the unique key caught it.
            Err(e) if e.is_constraint() => {
                return Err(PolicyViolation::RoleplayAlreadySubmittedToday.into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            submission_id = %submission.id(),
            player_id = %player_id,
            links = submission.links().len(),
            "Roleplay links submitted"
        );
        Ok(submission)
    }
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub link: RoleplayLink,
    pub digest_progress: i32,
}

/// Staff grade one link. The digest gain commits with the review or not at all.
pub struct ReviewRoleplayLink {
    roleplay: Arc<dyn RoleplayRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl ReviewRoleplayLink {
    pub fn new(
        roleplay: Arc<dyn RoleplayRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            roleplay,
            profiles,
            activity,
            clock,
        }
    }

    pub async fn execute(
        &self,
        reviewer_id: ProfileId,
        link_id: RoleplayLinkId,
        level: DigestLevel,
        note: &str,
    ) -> Result<ReviewOutcome, UseCaseError> {
        let reviewer = require_staff(self.profiles.as_ref(), reviewer_id).await?;
        let mut link = self
            .roleplay
            .get_link(link_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Roleplay link", link_id))?;
        let now = self.clock.now();
        link.review_with(level, note, reviewer.id(), now)?;

        let mut profile = load_profile(self.profiles.as_ref(), link.player_id()).await?;
        let percent = level.percent();
        if percent > 0 {
            profile.advance_digest(percent);
        }

        if self
            .roleplay
            .review_link_with_profile(&link, &profile)
            .await?
            == TransitionOutcome::AlreadyResolved
        {
            tracing::info!(link_id = %link_id, "Roleplay review lost a race");
            return Err(UseCaseError::already_resolved(format!(
                "roleplay link {link_id} already reviewed"
            )));
        }
        tracing::info!(
            link_id = %link_id,
            player_id = %link.player_id(),
            reviewer_id = %reviewer.id(),
            level = level.as_str(),
            digest = profile.digest_progress(),
            "Roleplay link reviewed"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                link.player_id(),
                Some(reviewer.id()),
                ActivityEntry::RoleplayReviewed {
                    link_id,
                    level,
                    digest_after: profile.digest_progress(),
                },
                now,
            ),
        )
        .await;

        Ok(ReviewOutcome {
            link,
            digest_progress: profile.digest_progress(),
        })
    }
}

/// A player with a full digest steps one sequence closer to 0.
pub struct PromoteSequence {
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl PromoteSequence {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            profiles,
            activity,
            clock,
        }
    }

    pub async fn execute(&self, player_id: ProfileId) -> Result<Profile, UseCaseError> {
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;
        let sequence = profile.promote_sequence()?;
        self.profiles.save(&profile).await?;
        tracing::info!(player_id = %player_id, sequence, "Sequence promoted");

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                Some(player_id),
                ActivityEntry::SequencePromoted { sequence },
                self.clock.now(),
            ),
        )
        .await;
        Ok(profile)
    }
}
