//! Approval use cases.
//!
//! Staff resolve pending submissions. An approval applies the reward through
//! the ledger and commits the status change together with the rewarded profile,
//! guarded on the row still being pending. Whoever loses a race gets
//! [`UseCaseError::AlreadyResolved`] and nothing is written on their behalf.

use std::sync::Arc;

use covenant_domain::{
    LedgerChange, Notification, NotificationKind, ProfileId, Submission, SubmissionId,
    SubmissionKind,
};

use super::shared::{load_profile, notify, require_staff};
use super::UseCaseError;
use crate::infrastructure::ports::{
    ClockPort, CodeRepo, NotificationPort, ProfileRepo, SubmissionRepo, TransitionOutcome,
};

/// Container for approval use cases.
pub struct ApprovalUseCases {
    pub approve: Arc<ApproveSubmission>,
    pub reject: Arc<RejectSubmission>,
}

impl ApprovalUseCases {
    pub fn new(approve: Arc<ApproveSubmission>, reject: Arc<RejectSubmission>) -> Self {
        Self { approve, reject }
    }
}

/// Result of an approval.
#[derive(Debug, Clone)]
pub struct ApprovalResult {
    pub submission: Submission,
    /// The player's vitals before and after the reward.
    pub change: LedgerChange,
}

/// Approve a pending submission and pay out its reward.
pub struct ApproveSubmission {
    submissions: Arc<dyn SubmissionRepo>,
    codes: Arc<dyn CodeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
}

impl ApproveSubmission {
    pub fn new(
        submissions: Arc<dyn SubmissionRepo>,
        codes: Arc<dyn CodeRepo>,
        profiles: Arc<dyn ProfileRepo>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            submissions,
            codes,
            profiles,
            notifier,
            clock,
        }
    }

    /// Staff approval.
    pub async fn execute(
        &self,
        reviewer_id: ProfileId,
        submission_id: SubmissionId,
    ) -> Result<ApprovalResult, UseCaseError> {
        require_staff(self.profiles.as_ref(), reviewer_id).await?;
        let submission = self
            .submissions
            .get(submission_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Submission", submission_id))?;
        self.resolve(submission, Some(reviewer_id)).await
    }

    /// Approval with no reviewer, used by the overdue-sleep sweep.
    pub async fn approve_automatically(
        &self,
        submission: Submission,
    ) -> Result<ApprovalResult, UseCaseError> {
        self.resolve(submission, None).await
    }

    async fn resolve(
        &self,
        mut submission: Submission,
        reviewer: Option<ProfileId>,
    ) -> Result<ApprovalResult, UseCaseError> {
        if !submission.is_pending() {
            return Err(UseCaseError::already_resolved(format!(
                "submission {} is already {}",
                submission.id(),
                submission.status()
            )));
        }

        let mut profile = load_profile(self.profiles.as_ref(), submission.player_id()).await?;
        let change = match submission.kind() {
            SubmissionKind::Sleep => profile.restore_spirit(),
            SubmissionKind::Action | SubmissionKind::Quest => {
                let code_id = submission.code_id().ok_or_else(|| {
                    UseCaseError::validation("submission is not attached to a code")
                })?;
                // Archived codes still resolve here.
                let code = self
                    .codes
                    .get(code_id)
                    .await?
                    .ok_or_else(|| UseCaseError::not_found("Code", code_id))?;
                profile.apply_delta(code.reward())
            }
        };

        let now = self.clock.now();
        submission.approve(reviewer, now)?;

        match self
            .submissions
            .resolve_with_profile(&submission, &profile)
            .await?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::AlreadyResolved => {
                tracing::info!(submission_id = %submission.id(), "Approval lost the race");
                return Err(UseCaseError::already_resolved(format!(
                    "submission {} was resolved by someone else",
                    submission.id()
                )));
            }
        }

        tracing::info!(
            submission_id = %submission.id(),
            player_id = %submission.player_id(),
            kind = %submission.kind(),
            automatic = reviewer.is_none(),
            "Submission approved"
        );

        let message = match submission.kind() {
            SubmissionKind::Sleep => {
                "Your sleep request was approved. Spirit restored.".to_string()
            }
            kind => format!("Your {kind} submission was approved."),
        };
        notify(
            self.notifier.as_ref(),
            Notification::new(
                submission.player_id(),
                reviewer,
                NotificationKind::approved(submission.kind()),
                format!("{} approved", title_case(submission.kind())),
                message,
                now,
            ),
        )
        .await;

        Ok(ApprovalResult { submission, change })
    }
}

/// Reject a pending submission. Action and quest rejections need a reason.
pub struct RejectSubmission {
    submissions: Arc<dyn SubmissionRepo>,
    profiles: Arc<dyn ProfileRepo>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
}

impl RejectSubmission {
    pub fn new(
        submissions: Arc<dyn SubmissionRepo>,
        profiles: Arc<dyn ProfileRepo>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            submissions,
            profiles,
            notifier,
            clock,
        }
    }

    pub async fn execute(
        &self,
        reviewer_id: ProfileId,
        submission_id: SubmissionId,
        reason: Option<String>,
    ) -> Result<Submission, UseCaseError> {
        require_staff(self.profiles.as_ref(), reviewer_id).await?;
        let mut submission = self
            .submissions
            .get(submission_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Submission", submission_id))?;

        let now = self.clock.now();
        submission.reject(Some(reviewer_id), reason, now)?;

        if self.submissions.resolve(&submission).await? == TransitionOutcome::AlreadyResolved {
            tracing::info!(submission_id = %submission_id, "Rejection lost the race");
            return Err(UseCaseError::already_resolved(format!(
                "submission {submission_id} was resolved by someone else"
            )));
        }

        tracing::info!(
            submission_id = %submission_id,
            player_id = %submission.player_id(),
            kind = %submission.kind(),
            "Submission rejected"
        );

        let message = match submission.rejection_reason() {
            Some(reason) => format!("Your {} submission was rejected: {reason}", submission.kind()),
            None => format!("Your {} submission was rejected.", submission.kind()),
        };
        notify(
            self.notifier.as_ref(),
            Notification::new(
                submission.player_id(),
                Some(reviewer_id),
                NotificationKind::rejected(submission.kind()),
                format!("{} rejected", title_case(submission.kind())),
                message,
                now,
            ),
        )
        .await;

        Ok(submission)
    }
}

fn title_case(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Action => "Action",
        SubmissionKind::Quest => "Quest",
        SubmissionKind::Sleep => "Sleep",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;
    use covenant_domain::{
        Code, CodeKind, Evidence, Profile, ResourceDelta, Role, ShortCode, SubmissionStatus,
        Vitals,
    };

    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        MockCodeRepo, MockNotificationPort, MockProfileRepo, MockSubmissionRepo, NotifyError,
    };

    struct Fixture {
        staff: Profile,
        player: Profile,
    }

    impl Fixture {
        fn new(player_vitals: Vitals) -> Self {
            let now = Utc::now();
            Self {
                staff: Profile::new("Arbiter", Role::Staff, now),
                player: Profile::new("Klein", Role::Player, now).with_vitals(player_vitals),
            }
        }

        fn profiles(&self) -> MockProfileRepo {
            let staff = self.staff.clone();
            let player = self.player.clone();
            let mut repo = MockProfileRepo::new();
            repo.expect_get().returning(move |id| {
                if id == staff.id() {
                    Ok(Some(staff.clone()))
                } else if id == player.id() {
                    Ok(Some(player.clone()))
                } else {
                    Ok(None)
                }
            });
            repo
        }
    }

    fn code(kind: CodeKind, reward: ResourceDelta) -> Code {
        Code::new(
            kind,
            "Errand",
            ShortCode::new("01-01-26-abcd").unwrap(),
            reward,
            ProfileId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    fn codes_with(code: Code) -> MockCodeRepo {
        let mut codes = MockCodeRepo::new();
        codes
            .expect_get()
            .returning(move |_| Ok(Some(code.clone())));
        codes
    }

    fn submission_for(player: &Profile, code: &Code) -> Submission {
        Submission::for_code(
            code.kind(),
            player.id(),
            code.id(),
            Evidence::new(["https://img/1.png"]).unwrap(),
            Utc::now(),
        )
    }

    fn submissions_with(submission: Submission) -> MockSubmissionRepo {
        let mut repo = MockSubmissionRepo::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(submission.clone())));
        repo
    }

    fn quiet_notifier(times: usize) -> MockNotificationPort {
        let mut notifier = MockNotificationPort::new();
        notifier.expect_dispatch().times(times).returning(|_| Ok(()));
        notifier
    }

    mod approve {
        use super::*;

        #[tokio::test]
        async fn quest_penalty_floors_sanity_at_zero() {
            let fx = Fixture::new(Vitals::new(10, (2, 10), (5, 5), (5, 5)));
            let quest = code(CodeKind::Quest, ResourceDelta::ZERO.with_sanity(-3));
            let pending = submission_for(&fx.player, &quest);
            let mut subs = submissions_with(pending.clone());
            subs.expect_resolve_with_profile()
                .withf(|s, p| s.status() == SubmissionStatus::Approved && p.vitals().sanity() == 0)
                .times(1)
                .returning(|_, _| Ok(TransitionOutcome::Applied));

            let use_case = ApproveSubmission::new(
                Arc::new(subs),
                Arc::new(codes_with(quest)),
                Arc::new(fx.profiles()),
                Arc::new(quiet_notifier(1)),
                Arc::new(FixedClock(Utc::now())),
            );
            let result = use_case.execute(fx.staff.id(), pending.id()).await.unwrap();

            assert_eq!(result.change.before.sanity(), 2);
            assert_eq!(result.change.after.sanity(), 0);
            assert_eq!(result.submission.reviewed_by(), Some(fx.staff.id()));
        }

        #[tokio::test]
        async fn concurrent_double_approve_rewards_once() {
            let fx = Fixture::new(Vitals::new(10, (4, 10), (5, 5), (5, 5)));
            let action = code(CodeKind::Action, ResourceDelta::ZERO.with_sanity(3));
            let pending = submission_for(&fx.player, &action);

            let first = Arc::new(AtomicBool::new(true));
            let mut subs = submissions_with(pending.clone());
            subs.expect_resolve_with_profile()
                .times(2)
                .returning(move |_, _| {
                    if first.swap(false, Ordering::SeqCst) {
                        Ok(TransitionOutcome::Applied)
                    } else {
                        Ok(TransitionOutcome::AlreadyResolved)
                    }
                });

            let use_case = ApproveSubmission::new(
                Arc::new(subs),
                Arc::new(codes_with(action)),
                Arc::new(fx.profiles()),
                Arc::new(quiet_notifier(1)),
                Arc::new(FixedClock(Utc::now())),
            );

            let (a, b) = tokio::join!(
                use_case.execute(fx.staff.id(), pending.id()),
                use_case.execute(fx.staff.id(), pending.id())
            );
            let outcomes = [a, b];
            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
            assert_eq!(
                outcomes
                    .iter()
                    .filter(|r| matches!(r, Err(UseCaseError::AlreadyResolved(_))))
                    .count(),
                1
            );
        }

        #[tokio::test]
        async fn sleep_restores_spirit_without_reviewer() {
            let fx = Fixture::new(Vitals::new(10, (5, 10), (5, 5), (1, 8)));
            let sleep = Submission::sleep(
                fx.player.id(),
                Evidence::new(["meal", "bed"]).unwrap(),
                Utc::now(),
            );
            let mut subs = MockSubmissionRepo::new();
            subs.expect_resolve_with_profile()
                .withf(|s, p| s.reviewed_by().is_none() && p.vitals().spirit() == 8)
                .times(1)
                .returning(|_, _| Ok(TransitionOutcome::Applied));
            let mut notifier = MockNotificationPort::new();
            notifier
                .expect_dispatch()
                .withf(|n| n.kind == NotificationKind::SleepApproved && n.actor.is_none())
                .times(1)
                .returning(|_| Ok(()));

            let use_case = ApproveSubmission::new(
                Arc::new(subs),
                Arc::new(MockCodeRepo::new()),
                Arc::new(fx.profiles()),
                Arc::new(notifier),
                Arc::new(FixedClock(Utc::now())),
            );
            let result = use_case.approve_automatically(sleep).await.unwrap();
            assert_eq!(result.change.after.spirit(), 8);
        }

        #[tokio::test]
        async fn notification_failure_does_not_fail_approval() {
            let fx = Fixture::new(Vitals::default());
            let action = code(CodeKind::Action, ResourceDelta::ZERO.with_hp(1));
            let pending = submission_for(&fx.player, &action);
            let mut subs = submissions_with(pending.clone());
            subs.expect_resolve_with_profile()
                .returning(|_, _| Ok(TransitionOutcome::Applied));
            let mut notifier = MockNotificationPort::new();
            notifier
                .expect_dispatch()
                .returning(|_| Err(NotifyError::DispatchFailed("offline".into())));

            let use_case = ApproveSubmission::new(
                Arc::new(subs),
                Arc::new(codes_with(action)),
                Arc::new(fx.profiles()),
                Arc::new(notifier),
                Arc::new(FixedClock(Utc::now())),
            );
            assert!(use_case.execute(fx.staff.id(), pending.id()).await.is_ok());
        }

        #[tokio::test]
        async fn players_cannot_approve() {
            let fx = Fixture::new(Vitals::default());
            let use_case = ApproveSubmission::new(
                Arc::new(MockSubmissionRepo::new()),
                Arc::new(MockCodeRepo::new()),
                Arc::new(fx.profiles()),
                Arc::new(MockNotificationPort::new()),
                Arc::new(FixedClock(Utc::now())),
            );
            let err = use_case
                .execute(fx.player.id(), SubmissionId::new())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "staff only");
        }
    }

    mod reject {
        use super::*;

        fn reject_use_case(
            fx: &Fixture,
            subs: MockSubmissionRepo,
            notifications: usize,
        ) -> RejectSubmission {
            RejectSubmission::new(
                Arc::new(subs),
                Arc::new(fx.profiles()),
                Arc::new(quiet_notifier(notifications)),
                Arc::new(FixedClock(Utc::now())),
            )
        }

        #[tokio::test]
        async fn action_requires_reason() {
            let fx = Fixture::new(Vitals::default());
            let pending = submission_for(&fx.player, &code(CodeKind::Action, ResourceDelta::ZERO));
            let use_case = reject_use_case(&fx, submissions_with(pending.clone()), 0);

            let err = use_case
                .execute(fx.staff.id(), pending.id(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, UseCaseError::Validation(_)));
        }

        #[tokio::test]
        async fn already_approved_is_already_resolved() {
            let fx = Fixture::new(Vitals::default());
            let mut approved =
                submission_for(&fx.player, &code(CodeKind::Quest, ResourceDelta::ZERO));
            approved.approve(Some(fx.staff.id()), Utc::now()).unwrap();
            let use_case = reject_use_case(&fx, submissions_with(approved.clone()), 0);

            let err = use_case
                .execute(fx.staff.id(), approved.id(), Some("late".into()))
                .await
                .unwrap_err();
            assert!(matches!(err, UseCaseError::AlreadyResolved(_)));
        }

        #[tokio::test]
        async fn rejection_carries_reason_to_player() {
            let fx = Fixture::new(Vitals::default());
            let pending = submission_for(&fx.player, &code(CodeKind::Action, ResourceDelta::ZERO));
            let mut subs = submissions_with(pending.clone());
            subs.expect_resolve()
                .withf(|s| s.status() == SubmissionStatus::Rejected)
                .times(1)
                .returning(|_| Ok(TransitionOutcome::Applied));

            let rejected = reject_use_case(&fx, subs, 1)
                .execute(fx.staff.id(), pending.id(), Some(" photo is blurry ".into()))
                .await
                .unwrap();
            assert_eq!(rejected.rejection_reason(), Some("photo is blurry"));
        }
    }
}
