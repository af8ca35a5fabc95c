//! Skill cast use cases.
//!
//! A cast spends spirit and rolls a d20 against a player-declared threshold.
//! The cost is always paid; success only decides how the result reads.
//!
//! Two sources:
//! - pathway skills, gated by pathway and sequence rank
//! - granted skills, gated by ownership, expiry and reuse policy, which also
//!   carry effects applied on top of the cost

use std::sync::Arc;

use covenant_domain::{
    ActivityEntry, ActivityLog, CastReference, CastSource, GameCalendar, GrantedSkillId,
    LedgerChange, PolicyViolation, Profile, ProfileId, ResourceDelta, SkillId, SuccessThreshold,
    CAST_DIE_FACES,
};

mod grants;

pub use grants::{GrantSkill, GrantSkillInput, TransferGrantedSkill};

use super::shared::{load_profile, record_activity};
use super::UseCaseError;
use crate::infrastructure::ports::{
    ActivityLogRepo, ClockPort, GrantedSkillRepo, ProfileRepo, RandomPort, SkillRepo,
    TransitionOutcome,
};

/// Container for skill use cases.
pub struct SkillCastUseCases {
    pub cast_pathway: Arc<CastPathwaySkill>,
    pub cast_granted: Arc<CastGrantedSkill>,
    pub grant: Arc<GrantSkill>,
    pub transfer: Arc<TransferGrantedSkill>,
}

impl SkillCastUseCases {
    pub fn new(
        cast_pathway: Arc<CastPathwaySkill>,
        cast_granted: Arc<CastGrantedSkill>,
        grant: Arc<GrantSkill>,
        transfer: Arc<TransferGrantedSkill>,
    ) -> Self {
        Self {
            cast_pathway,
            cast_granted,
            grant,
            transfer,
        }
    }
}

/// Result of a cast.
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub reference: CastReference,
    /// The raw d20 value
    pub roll: i32,
    pub threshold: i32,
    pub success: bool,
    pub spirit_cost: i32,
    /// Vitals before the cost and after every effect
    pub change: LedgerChange,
}

fn roll_d20(random: &dyn RandomPort, threshold: SuccessThreshold) -> (i32, bool) {
    let roll = random.gen_range(1, CAST_DIE_FACES);
    (roll, threshold.is_met_by(roll))
}

fn ensure_spirit(profile: &Profile, cost: i32) -> Result<(), UseCaseError> {
    let have = profile.vitals().spirit();
    if have < cost {
        return Err(PolicyViolation::InsufficientSpirit { have, need: cost }.into());
    }
    Ok(())
}

// =============================================================================
// Pathway skills
// =============================================================================

/// Cast a skill from the player's pathway.
pub struct CastPathwaySkill {
    skills: Arc<dyn SkillRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    calendar: GameCalendar,
}

impl CastPathwaySkill {
    pub fn new(
        skills: Arc<dyn SkillRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            skills,
            profiles,
            activity,
            clock,
            random,
            calendar,
        }
    }

    pub async fn execute(
        &self,
        player_id: ProfileId,
        skill_id: SkillId,
        threshold: i32,
    ) -> Result<CastOutcome, UseCaseError> {
        let threshold = SuccessThreshold::new(threshold)?;
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;
        let skill = self
            .skills
            .get(skill_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Skill", skill_id))?;

        if !skill.pathway_allows(&profile) {
            return Err(PolicyViolation::PathwayMismatch.into());
        }
        if !skill.rank_allows(&profile) {
            return Err(PolicyViolation::SequenceTooLow {
                required: skill.sequence,
            }
            .into());
        }
        ensure_spirit(&profile, skill.spirit_cost)?;

        let (roll, success) = roll_d20(self.random.as_ref(), threshold);
        let change = profile.apply_delta(&ResourceDelta::spirit_cost(skill.spirit_cost));
        self.profiles.save(&profile).await?;

        let now = self.clock.now();
        let reference = CastReference::new(
            CastSource::Pathway,
            player_id,
            self.calendar.local_date(now),
            threshold.value(),
            roll,
            success,
        );
        tracing::info!(
            player_id = %player_id,
            skill_id = %skill_id,
            roll,
            threshold = threshold.value(),
            success,
            reference = %reference,
            "Pathway skill cast"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                Some(player_id),
                ActivityEntry::SkillCast {
                    source: CastSource::Pathway,
                    skill_id,
                    granted_skill_id: None,
                    reference: reference.clone(),
                    threshold: threshold.value(),
                    roll,
                    success,
                    spirit_cost: skill.spirit_cost,
                },
                now,
            ),
        )
        .await;

        Ok(CastOutcome {
            reference,
            roll,
            threshold: threshold.value(),
            success,
            spirit_cost: skill.spirit_cost,
            change,
        })
    }
}

// =============================================================================
// Granted skills
// =============================================================================

/// Cast a granted skill instance.
pub struct CastGrantedSkill {
    granted: Arc<dyn GrantedSkillRepo>,
    skills: Arc<dyn SkillRepo>,
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    calendar: GameCalendar,
}

impl CastGrantedSkill {
    pub fn new(
        granted: Arc<dyn GrantedSkillRepo>,
        skills: Arc<dyn SkillRepo>,
        profiles: Arc<dyn ProfileRepo>,
        activity: Arc<dyn ActivityLogRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            granted,
            skills,
            profiles,
            activity,
            clock,
            random,
            calendar,
        }
    }

    pub async fn execute(
        &self,
        player_id: ProfileId,
        grant_id: GrantedSkillId,
        threshold: i32,
    ) -> Result<CastOutcome, UseCaseError> {
        let threshold = SuccessThreshold::new(threshold)?;

        // Someone else's grant looks absent.
        let mut grant = self
            .granted
            .get(grant_id)
            .await?
            .filter(|g| g.player_id() == player_id)
            .ok_or_else(|| UseCaseError::not_found("Granted skill", grant_id))?;

        let now = self.clock.now();
        grant.check_active(now)?;
        if grant.is_expired(now) {
            grant.deactivate();
            self.granted.save(&grant).await?;
            tracing::debug!(grant_id = %grant_id, "Expired grant deactivated on cast attempt");
            return Err(PolicyViolation::GrantExpired.into());
        }
        grant.check_available(now)?;

        let skill = self
            .skills
            .get(grant.skill_id())
            .await?
            .ok_or_else(|| UseCaseError::not_found("Skill", grant.skill_id()))?;
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;
        ensure_spirit(&profile, skill.spirit_cost)?;

        let (roll, success) = roll_d20(self.random.as_ref(), threshold);

        // Cost first, then effects on top of it.
        let effects = *grant.effects();
        let paid = profile.apply_delta(&ResourceDelta::spirit_cost(skill.spirit_cost));
        let affected = profile.apply_delta(&effects.delta);
        if effects.progress != 0 {
            profile.advance_digest(effects.progress);
        }
        let change = LedgerChange {
            before: paid.before,
            after: affected.after,
        };

        let expected_times_used = grant.times_used();
        grant.record_use(now);
        match self
            .granted
            .commit_use(&grant, expected_times_used, &profile)
            .await?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::AlreadyResolved => {
                tracing::info!(grant_id = %grant_id, "Concurrent cast already used this grant");
                return Err(UseCaseError::already_resolved(format!(
                    "granted skill {grant_id} was used concurrently"
                )));
            }
        }

        let reference = CastReference::new(
            CastSource::Granted,
            player_id,
            self.calendar.local_date(now),
            threshold.value(),
            roll,
            success,
        );
        tracing::info!(
            player_id = %player_id,
            grant_id = %grant_id,
            roll,
            threshold = threshold.value(),
            success,
            reference = %reference,
            "Granted skill cast"
        );

        record_activity(
            self.activity.as_ref(),
            ActivityLog::new(
                player_id,
                Some(player_id),
                ActivityEntry::SkillCast {
                    source: CastSource::Granted,
                    skill_id: skill.id,
                    granted_skill_id: Some(grant_id),
                    reference: reference.clone(),
                    threshold: threshold.value(),
                    roll,
                    success,
                    spirit_cost: skill.spirit_cost,
                },
                now,
            ),
        )
        .await;

        Ok(CastOutcome {
            reference,
            roll,
            threshold: threshold.value(),
            success,
            spirit_cost: skill.spirit_cost,
            change,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use covenant_domain::{
        GrantedSkill, PathwayId, ReusePolicy, Role, Skill, SkillEffects, Vitals,
    };

    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{
        MockActivityLogRepo, MockGrantedSkillRepo, MockProfileRepo, MockSkillRepo,
    };
    use crate::infrastructure::sqlite::test_support::temp_store;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 3, 0, 0).unwrap()
    }

    fn profiles_with(profile: Profile, saves: usize) -> MockProfileRepo {
        let mut repo = MockProfileRepo::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(profile.clone())));
        repo.expect_save().times(saves).returning(|_| Ok(()));
        repo
    }

    fn skills_with(skill: Skill) -> MockSkillRepo {
        let mut repo = MockSkillRepo::new();
        repo.expect_get().returning(move |_| Ok(Some(skill.clone())));
        repo
    }

    fn activity() -> MockActivityLogRepo {
        let mut repo = MockActivityLogRepo::new();
        repo.expect_append().returning(|_| Ok(()));
        repo
    }

    mod pathway {
        use super::*;

        fn setup(roll: i32, profile: Profile, skill: Skill) -> CastPathwaySkill {
            CastPathwaySkill::new(
                Arc::new(skills_with(skill)),
                Arc::new(profiles_with(profile, 1)),
                Arc::new(activity()),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(roll)),
                GameCalendar::with_offset_hours(7).unwrap(),
            )
        }

        fn seer() -> (Profile, Skill) {
            let pathway = PathwayId::new();
            let profile = Profile::new("Klein", Role::Player, now())
                .with_pathway(pathway, 9)
                .with_vitals(Vitals::new(10, (10, 10), (5, 5), (5, 8)));
            let skill = Skill::new("Spirit Vision", 9, 2).unwrap().with_pathway(pathway);
            (profile, skill)
        }

        #[tokio::test]
        async fn roll_equal_to_threshold_succeeds_and_pays() {
            let (profile, skill) = seer();
            let outcome = setup(15, profile.clone(), skill.clone())
                .execute(profile.id(), skill.id, 15)
                .await
                .unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.change.after.spirit(), 3);
            assert!(outcome.reference.as_str().starts_with("SKL-"));
            assert!(outcome.reference.as_str().ends_with("-T15-R15-S"));
        }

        #[tokio::test]
        async fn roll_below_threshold_fails_and_still_pays() {
            let (profile, skill) = seer();
            let outcome = setup(14, profile.clone(), skill.clone())
                .execute(profile.id(), skill.id, 15)
                .await
                .unwrap();
            assert!(!outcome.success);
            assert_eq!(outcome.change.after.spirit(), 3);
            assert!(outcome.reference.as_str().ends_with("-R14-F"));
        }

        #[tokio::test]
        async fn threshold_out_of_range_is_invalid() {
            let (profile, skill) = seer();
            let use_case = CastPathwaySkill::new(
                Arc::new(MockSkillRepo::new()),
                Arc::new(MockProfileRepo::new()),
                Arc::new(MockActivityLogRepo::new()),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(10)),
                GameCalendar::utc(),
            );
            let err = use_case.execute(profile.id(), skill.id, 21).await.unwrap_err();
            assert!(matches!(err, UseCaseError::Validation(_)));
        }

        #[tokio::test]
        async fn rank_too_low_names_required_sequence() {
            let (profile, _) = seer();
            let advanced = Skill::new("Flaming Jump", 7, 3)
                .unwrap()
                .with_pathway(profile.pathway_id().unwrap());
            let use_case = CastPathwaySkill::new(
                Arc::new(skills_with(advanced.clone())),
                Arc::new(profiles_with(profile.clone(), 0)),
                Arc::new(MockActivityLogRepo::new()),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(20)),
                GameCalendar::utc(),
            );
            let err = use_case
                .execute(profile.id(), advanced.id, 10)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "requires sequence 7 or lower");
        }

        #[tokio::test]
        async fn other_pathway_is_refused() {
            let (profile, _) = seer();
            let foreign = Skill::new("Dawn", 9, 1).unwrap().with_pathway(PathwayId::new());
            let use_case = CastPathwaySkill::new(
                Arc::new(skills_with(foreign.clone())),
                Arc::new(profiles_with(profile.clone(), 0)),
                Arc::new(MockActivityLogRepo::new()),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(20)),
                GameCalendar::utc(),
            );
            let err = use_case.execute(profile.id(), foreign.id, 10).await.unwrap_err();
            assert!(matches!(
                err,
                UseCaseError::Policy(PolicyViolation::PathwayMismatch)
            ));
        }

        #[tokio::test]
        async fn insufficient_spirit_is_refused_before_rolling() {
            let (profile, skill) = seer();
            let drained = profile.with_vitals(Vitals::new(10, (10, 10), (5, 5), (1, 8)));
            let use_case = CastPathwaySkill::new(
                Arc::new(skills_with(skill.clone())),
                Arc::new(profiles_with(drained.clone(), 0)),
                Arc::new(MockActivityLogRepo::new()),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(20)),
                GameCalendar::utc(),
            );
            let err = use_case.execute(drained.id(), skill.id, 5).await.unwrap_err();
            assert_eq!(err.to_string(), "insufficient spirit (1/2)");
        }
    }

    mod granted {
        use super::*;

        struct Setup {
            profile: Profile,
            skill: Skill,
        }

        impl Setup {
            fn new() -> Self {
                Self {
                    profile: Profile::new("Audrey", Role::Player, now())
                        .with_vitals(Vitals::new(10, (5, 10), (5, 5), (6, 8)))
                        .with_digest_progress(40),
                    skill: Skill::new("Spectator's gaze", 9, 1).unwrap(),
                }
            }

            fn grant(&self, policy: ReusePolicy) -> GrantedSkill {
                GrantedSkill::new(
                    self.profile.id(),
                    self.skill.id,
                    ProfileId::new(),
                    "Gift of the Fool",
                    policy,
                    SkillEffects {
                        delta: ResourceDelta::ZERO.with_sanity(2),
                        progress: 10,
                    },
                    now() - Duration::days(1),
                )
                .unwrap()
            }

            fn use_case(&self, granted: MockGrantedSkillRepo) -> CastGrantedSkill {
                let mut profiles = MockProfileRepo::new();
                let profile = self.profile.clone();
                profiles
                    .expect_get()
                    .returning(move |_| Ok(Some(profile.clone())));
                CastGrantedSkill::new(
                    Arc::new(granted),
                    Arc::new(skills_with(self.skill.clone())),
                    Arc::new(profiles),
                    Arc::new(activity()),
                    Arc::new(FixedClock(now())),
                    Arc::new(FixedRandom(12)),
                    GameCalendar::with_offset_hours(7).unwrap(),
                )
            }
        }

        fn granted_repo(grant: GrantedSkill) -> MockGrantedSkillRepo {
            let mut repo = MockGrantedSkillRepo::new();
            repo.expect_get().returning(move |_| Ok(Some(grant.clone())));
            repo
        }

        #[tokio::test]
        async fn once_grant_casts_then_refuses() {
            let s = Setup::new();
            let grant = s.grant(ReusePolicy::Once);
            let grant_id = grant.id();

            let mut repo = granted_repo(grant.clone());
            repo.expect_commit_use()
                .withf(|g, expected, p| {
                    g.times_used() == 1
                        && !g.is_active()
                        && *expected == 0
                        && p.vitals().spirit() == 5
                        && p.vitals().sanity() == 7
                        && p.digest_progress() == 50
                })
                .times(1)
                .returning(|_, _, _| Ok(TransitionOutcome::Applied));

            let outcome = s
                .use_case(repo)
                .execute(s.profile.id(), grant_id, 10)
                .await
                .unwrap();
            assert!(outcome.success);
            assert!(outcome.reference.as_str().starts_with("GS-"));

            // The stored grant after the first cast: used up and inactive.
            let mut used = grant.clone();
            used.record_use(now());
            let err = s
                .use_case(granted_repo(used))
                .execute(s.profile.id(), grant_id, 10)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                UseCaseError::Policy(PolicyViolation::GrantAlreadyUsed)
            ));
        }

        #[tokio::test]
        async fn revoked_grant_is_inactive_not_missing() {
            let s = Setup::new();
            let grant = s.grant(ReusePolicy::Unlimited).with_active(false);
            let err = s
                .use_case(granted_repo(grant.clone()))
                .execute(s.profile.id(), grant.id(), 10)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                UseCaseError::Policy(PolicyViolation::GrantInactive)
            ));
        }

        #[tokio::test]
        async fn cooldown_reports_remaining_minutes() {
            let s = Setup::new();
            let grant = s
                .grant(ReusePolicy::Cooldown { minutes: 10 })
                .with_usage(1, Some(now() - Duration::minutes(5)));
            let err = s
                .use_case(granted_repo(grant.clone()))
                .execute(s.profile.id(), grant.id(), 10)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "cooldown active (5 min remaining)");
        }

        #[tokio::test]
        async fn expired_grant_is_deactivated_and_refused() {
            let s = Setup::new();
            let grant = s
                .grant(ReusePolicy::Unlimited)
                .with_expiry(now() - Duration::minutes(1));
            let mut repo = granted_repo(grant.clone());
            repo.expect_save()
                .withf(|g| !g.is_active())
                .times(1)
                .returning(|_| Ok(()));

            let err = s
                .use_case(repo)
                .execute(s.profile.id(), grant.id(), 10)
                .await
                .unwrap_err();
            assert!(matches!(err, UseCaseError::Policy(PolicyViolation::GrantExpired)));
        }

        #[tokio::test]
        async fn someone_elses_grant_is_not_found() {
            let s = Setup::new();
            let grant = s.grant(ReusePolicy::Unlimited);
            let err = s
                .use_case(granted_repo(grant.clone()))
                .execute(ProfileId::new(), grant.id(), 10)
                .await
                .unwrap_err();
            assert!(matches!(err, UseCaseError::NotFound { .. }));
        }

        #[tokio::test]
        async fn concurrent_once_casts_commit_once() {
            let s = Setup::new();
            let grant = s.grant(ReusePolicy::Once);
            let commits = Arc::new(AtomicUsize::new(0));
            let counter = commits.clone();

            let mut repo = granted_repo(grant.clone());
            repo.expect_commit_use().returning(move |_, _, _| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(TransitionOutcome::Applied)
                } else {
                    Ok(TransitionOutcome::AlreadyResolved)
                }
            });
            let use_case = s.use_case(repo);

            let (a, b) = tokio::join!(
                use_case.execute(s.profile.id(), grant.id(), 10),
                use_case.execute(s.profile.id(), grant.id(), 10)
            );
            assert_eq!(commits.load(Ordering::SeqCst), 2);
            assert!(a.is_ok() != b.is_ok());
        }

        #[tokio::test]
        async fn stored_once_grant_refuses_second_cast() {
            let (store, _dir) = temp_store().await;
            let s = Setup::new();
            let grant = s.grant(ReusePolicy::Once);
            ProfileRepo::save(&store, &s.profile).await.unwrap();
            SkillRepo::save(&store, &s.skill).await.unwrap();
            GrantedSkillRepo::save(&store, &grant).await.unwrap();

            let store = Arc::new(store);
            let use_case = CastGrantedSkill::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                Arc::new(FixedClock(now())),
                Arc::new(FixedRandom(12)),
                GameCalendar::with_offset_hours(7).unwrap(),
            );

            use_case.execute(s.profile.id(), grant.id(), 10).await.unwrap();
            let err = use_case
                .execute(s.profile.id(), grant.id(), 10)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "policy_violation");
            assert!(matches!(
                err,
                UseCaseError::Policy(PolicyViolation::GrantAlreadyUsed)
            ));
        }
    }
}
