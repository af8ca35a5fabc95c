//! Application state and composition.

use std::sync::Arc;

use covenant_domain::GameCalendar;

use crate::infrastructure::{
    ports::{
        ActivityLogRepo, ClockPort, CodeRepo, GrantedSkillRepo, MapRepo, NotificationPort,
        ProfileRepo, PunishmentRepo, RandomPort, RoleplayRepo, SkillRepo, SubmissionRepo,
    },
    sqlite::SqliteStore,
};
use crate::use_cases;

/// Main application state.
///
/// Holds every repository port and use case.
/// Passed to HTTP handlers via Axum state and to the sweep task.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Port traits injected directly into use cases.
pub struct Repositories {
    pub profile: Arc<dyn ProfileRepo>,
    pub code: Arc<dyn CodeRepo>,
    pub submission: Arc<dyn SubmissionRepo>,
    pub skill: Arc<dyn SkillRepo>,
    pub granted_skill: Arc<dyn GrantedSkillRepo>,
    pub punishment: Arc<dyn PunishmentRepo>,
    pub roleplay: Arc<dyn RoleplayRepo>,
    pub map: Arc<dyn MapRepo>,
    pub activity: Arc<dyn ActivityLogRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub submission: use_cases::SubmissionUseCases,
    pub approval: use_cases::ApprovalUseCases,
    pub skill: use_cases::SkillCastUseCases,
    pub punishment: use_cases::PunishmentUseCases,
    pub prayer: Arc<use_cases::SubmitPrayer>,
    pub roleplay: use_cases::RoleplayUseCases,
    pub admin: use_cases::AdminUseCases,
    pub sweep: use_cases::SweepUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// The store implements every port, notifications included (an outbox table).
    pub fn new(
        store: Arc<SqliteStore>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        calendar: GameCalendar,
    ) -> Self {
        let profile: Arc<dyn ProfileRepo> = store.clone();
        let code: Arc<dyn CodeRepo> = store.clone();
        let submission: Arc<dyn SubmissionRepo> = store.clone();
        let skill: Arc<dyn SkillRepo> = store.clone();
        let granted_skill: Arc<dyn GrantedSkillRepo> = store.clone();
        let punishment: Arc<dyn PunishmentRepo> = store.clone();
        let roleplay: Arc<dyn RoleplayRepo> = store.clone();
        let map: Arc<dyn MapRepo> = store.clone();
        let activity: Arc<dyn ActivityLogRepo> = store.clone();
        let notifier: Arc<dyn NotificationPort> = store;

        // Submissions and code authoring
        let submission_use_cases = use_cases::SubmissionUseCases::new(
            Arc::new(use_cases::submission::SubmitCode::new(
                code.clone(),
                submission.clone(),
                map.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::submission::SubmitSleep::new(
                submission.clone(),
                map.clone(),
                clock.clone(),
                calendar,
            )),
            Arc::new(use_cases::submission::FindPendingSubmission::new(
                submission.clone(),
            )),
            Arc::new(use_cases::submission::CreateCode::new(
                code.clone(),
                profile.clone(),
                map.clone(),
                clock.clone(),
                random.clone(),
                calendar,
            )),
            Arc::new(use_cases::submission::UpdateCode::new(
                code.clone(),
                profile.clone(),
                map.clone(),
            )),
            Arc::new(use_cases::submission::ArchiveCode::new(
                code.clone(),
                profile.clone(),
            )),
        );

        // Approval (shared with the overdue-sleep sweep)
        let approve = Arc::new(use_cases::approval::ApproveSubmission::new(
            submission.clone(),
            code.clone(),
            profile.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let approval = use_cases::ApprovalUseCases::new(
            approve.clone(),
            Arc::new(use_cases::approval::RejectSubmission::new(
                submission.clone(),
                profile.clone(),
                notifier.clone(),
                clock.clone(),
            )),
        );

        let skill_use_cases = use_cases::SkillCastUseCases::new(
            Arc::new(use_cases::skill_cast::CastPathwaySkill::new(
                skill.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
                random.clone(),
                calendar,
            )),
            Arc::new(use_cases::skill_cast::CastGrantedSkill::new(
                granted_skill.clone(),
                skill.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
                random,
                calendar,
            )),
            Arc::new(use_cases::skill_cast::GrantSkill::new(
                granted_skill.clone(),
                skill.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::skill_cast::TransferGrantedSkill::new(
                granted_skill.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
        );

        // Punishments (penalty shared with the expiry sweep)
        let check_completion = Arc::new(use_cases::punishment::CheckCompletion::new(
            punishment.clone(),
            submission.clone(),
        ));
        let apply_penalty = Arc::new(use_cases::punishment::ApplyPenalty::new(
            punishment.clone(),
            profile.clone(),
            activity.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let punishment_use_cases = use_cases::PunishmentUseCases::new(
            Arc::new(use_cases::punishment::AssignPunishment::new(
                punishment.clone(),
                code.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
            check_completion.clone(),
            Arc::new(use_cases::punishment::RequestMercy::new(
                punishment.clone(),
                check_completion,
                activity.clone(),
                notifier,
                clock.clone(),
            )),
            apply_penalty.clone(),
            Arc::new(use_cases::punishment::UpdatePunishment::new(
                punishment.clone(),
                profile.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::punishment::ArchivePunishment::new(
                punishment.clone(),
                profile.clone(),
            )),
        );

        let prayer = Arc::new(use_cases::SubmitPrayer::new(
            profile.clone(),
            map.clone(),
            activity.clone(),
            clock.clone(),
        ));

        let roleplay_use_cases = use_cases::RoleplayUseCases::new(
            Arc::new(use_cases::roleplay::SubmitRoleplayLinks::new(
                roleplay.clone(),
                profile.clone(),
                clock.clone(),
                calendar,
            )),
            Arc::new(use_cases::roleplay::ReviewRoleplayLink::new(
                roleplay.clone(),
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::roleplay::PromoteSequence::new(
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
        );

        // Staff seeding and profile management
        let admin = use_cases::AdminUseCases::new(
            Arc::new(use_cases::admin::RegisterProfile::new(
                profile.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::admin::UpdatePlayer::new(
                profile.clone(),
                activity.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::admin::SetReligion::new(profile.clone())),
            Arc::new(use_cases::admin::CreateSkill::new(
                skill.clone(),
                profile.clone(),
            )),
            Arc::new(use_cases::admin::PlacePlayerToken::new(
                map.clone(),
                profile.clone(),
            )),
            Arc::new(use_cases::admin::AddNpcToken::new(map.clone(), profile.clone())),
            Arc::new(use_cases::admin::AddLandmark::new(map.clone(), profile.clone())),
            Arc::new(use_cases::admin::ListActivity::new(
                activity.clone(),
                profile.clone(),
            )),
        );

        let sweep = use_cases::SweepUseCases::new(
            Arc::new(use_cases::sweep::ResolveOverdueSleep::new(
                submission.clone(),
                approve,
                clock.clone(),
                calendar,
            )),
            Arc::new(use_cases::sweep::EnforceExpiredPunishments::new(
                punishment.clone(),
                apply_penalty,
                clock,
            )),
        );

        Self {
            repositories: Repositories {
                profile,
                code,
                submission,
                skill,
                granted_skill,
                punishment,
                roleplay,
                map,
                activity,
            },
            use_cases: UseCases {
                submission: submission_use_cases,
                approval,
                skill: skill_use_cases,
                punishment: punishment_use_cases,
                prayer,
                roleplay: roleplay_use_cases,
                admin,
                sweep,
            },
        }
    }
}
