//! Periodic sweeps.
//!
//! Both reuse the manual transitions, so the conditional writes behave the
//! same whether a reviewer or the sweep gets there first. A lost race is
//! expected here and only logged at debug.

use std::sync::Arc;

use covenant_domain::{GameCalendar, SubmissionKind};

use super::approval::ApproveSubmission;
use super::punishment::ApplyPenalty;
use super::UseCaseError;
use crate::infrastructure::ports::{ClockPort, PunishmentRepo, SubmissionRepo};

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub resolved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    /// Returns false when the item failed and should be retried next pass.
    fn record(&mut self, result: Result<(), UseCaseError>, what: &'static str) -> bool {
        match result {
            Ok(()) => self.resolved += 1,
            Err(UseCaseError::AlreadyResolved(msg)) => {
                tracing::debug!(%msg, what, "Sweep skipped an already resolved item");
                self.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, what, "Sweep item failed");
                self.failed += 1;
                return false;
            }
        }
        true
    }
}

/// Container for sweep use cases.
pub struct SweepUseCases {
    pub overdue_sleep: Arc<ResolveOverdueSleep>,
    pub expired_punishments: Arc<EnforceExpiredPunishments>,
}

impl SweepUseCases {
    pub fn new(
        overdue_sleep: Arc<ResolveOverdueSleep>,
        expired_punishments: Arc<EnforceExpiredPunishments>,
    ) -> Self {
        Self {
            overdue_sleep,
            expired_punishments,
        }
    }

    pub async fn run_once(&self) -> Result<(SweepReport, SweepReport), UseCaseError> {
        let sleep = self.overdue_sleep.execute().await?;
        let punishments = self.expired_punishments.execute().await?;
        Ok((sleep, punishments))
    }
}

/// Approves every sleep request left pending from before today's local midnight.
pub struct ResolveOverdueSleep {
    submissions: Arc<dyn SubmissionRepo>,
    approve: Arc<ApproveSubmission>,
    clock: Arc<dyn ClockPort>,
    calendar: GameCalendar,
}

impl ResolveOverdueSleep {
    pub fn new(
        submissions: Arc<dyn SubmissionRepo>,
        approve: Arc<ApproveSubmission>,
        clock: Arc<dyn ClockPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            submissions,
            approve,
            clock,
            calendar,
        }
    }

    pub async fn execute(&self) -> Result<SweepReport, UseCaseError> {
        let cutoff = self.calendar.start_of_day(self.clock.now());
        let overdue = self
            .submissions
            .list_pending_created_before(SubmissionKind::Sleep, cutoff)
            .await?;

        let mut report = SweepReport::default();
        for submission in overdue {
            let result = self.approve.approve_automatically(submission).await;
            report.record(result.map(|_| ()), "overdue_sleep");
        }
        if report.resolved > 0 {
            tracing::info!(approved = report.resolved, "Overdue sleep requests approved");
        }
        Ok(report)
    }
}

/// Applies the penalty to everyone still unsettled on a punishment past its deadline.
pub struct EnforceExpiredPunishments {
    punishments: Arc<dyn PunishmentRepo>,
    apply_penalty: Arc<ApplyPenalty>,
    clock: Arc<dyn ClockPort>,
}

impl EnforceExpiredPunishments {
    pub fn new(
        punishments: Arc<dyn PunishmentRepo>,
        apply_penalty: Arc<ApplyPenalty>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            punishments,
            apply_penalty,
            clock,
        }
    }

    pub async fn execute(&self) -> Result<SweepReport, UseCaseError> {
        let overdue = self.punishments.list_overdue(self.clock.now()).await?;

        let mut report = SweepReport::default();
        for mut punishment in overdue {
            let rows = self.punishments.list_players(punishment.id()).await?;
            let mut settled_all = true;
            for row in rows.iter().filter(|r| !r.is_settled()) {
                let result = self
                    .apply_penalty
                    .apply_automatically(&punishment, row.player_id())
                    .await;
                settled_all &= report.record(result.map(|_| ()), "expired_punishment");
            }

            // Stays active so the next pass retries the failed rows.
            if !settled_all {
                tracing::warn!(
                    punishment_id = %punishment.id(),
                    "Expired punishment left open after failed penalties"
                );
                continue;
            }
            punishment.deactivate();
            self.punishments.save(&punishment).await?;
            tracing::info!(punishment_id = %punishment.id(), "Expired punishment closed");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use covenant_domain::{
        CodeId, CodeKind, EventMode, Evidence, Profile, ProfileId, Punishment, PunishmentPlayer,
        RequiredTask, ResourceDelta, Role, Submission, Vitals,
    };

    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        MockActivityLogRepo, MockCodeRepo, MockNotificationPort, MockProfileRepo,
        MockPunishmentRepo, MockSubmissionRepo, RepoError, TransitionOutcome,
    };

    /// 2025-03-12 10:00 at +7.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 3, 0, 0).unwrap()
    }

    fn calendar() -> GameCalendar {
        GameCalendar::with_offset_hours(7).unwrap()
    }

    fn quiet_notifier() -> MockNotificationPort {
        let mut port = MockNotificationPort::new();
        port.expect_dispatch().returning(|_| Ok(()));
        port
    }

    fn directory(profiles: Vec<Profile>) -> MockProfileRepo {
        let mut repo = MockProfileRepo::new();
        repo.expect_get()
            .returning(move |id| Ok(profiles.iter().find(|p| p.id() == id).cloned()));
        repo
    }

    mod overdue_sleep {
        use super::*;

        #[tokio::test]
        async fn pending_sleep_from_yesterday_is_approved_without_reviewer() {
            let player = Profile::new("Klein", Role::Player, now())
                .with_vitals(Vitals::new(10, (5, 10), (5, 5), (1, 8)));
            let yesterday = Submission::sleep(
                player.id(),
                Evidence::new(["meal", "bed"]).unwrap(),
                now() - Duration::hours(20),
            );

            let mut listing = MockSubmissionRepo::new();
            let cutoff = calendar().start_of_day(now());
            let pending = yesterday.clone();
            listing
                .expect_list_pending_created_before()
                .withf(move |kind, before| *kind == SubmissionKind::Sleep && *before == cutoff)
                .times(1)
                .returning(move |_, _| Ok(vec![pending.clone()]));
            listing
                .expect_resolve_with_profile()
                .withf(|s, p| s.reviewed_by().is_none() && p.vitals().spirit() == 8)
                .times(1)
                .returning(|_, _| Ok(TransitionOutcome::Applied));
            let submissions: Arc<dyn SubmissionRepo> = Arc::new(listing);

            let approve = Arc::new(ApproveSubmission::new(
                submissions.clone(),
                Arc::new(MockCodeRepo::new()),
                Arc::new(directory(vec![player])),
                Arc::new(quiet_notifier()),
                Arc::new(FixedClock(now())),
            ));
            let sweep =
                ResolveOverdueSleep::new(
                    submissions,
                    approve,
                    Arc::new(FixedClock(now())),
                    calendar(),
                );

            let report = sweep.execute().await.unwrap();
            assert_eq!(report.resolved, 1);
        }

        #[tokio::test]
        async fn reviewer_winning_the_race_is_skipped() {
            let player = Profile::new("Klein", Role::Player, now());
            let pending = Submission::sleep(
                player.id(),
                Evidence::new(["meal", "bed"]).unwrap(),
                now() - Duration::hours(20),
            );

            let mut listing = MockSubmissionRepo::new();
            listing
                .expect_list_pending_created_before()
                .returning(move |_, _| Ok(vec![pending.clone()]));
            listing
                .expect_resolve_with_profile()
                .returning(|_, _| Ok(TransitionOutcome::AlreadyResolved));
            let submissions: Arc<dyn SubmissionRepo> = Arc::new(listing);

            let approve = Arc::new(ApproveSubmission::new(
                submissions.clone(),
                Arc::new(MockCodeRepo::new()),
                Arc::new(directory(vec![player])),
                Arc::new(MockNotificationPort::new()),
                Arc::new(FixedClock(now())),
            ));
            let sweep =
                ResolveOverdueSleep::new(
                    submissions,
                    approve,
                    Arc::new(FixedClock(now())),
                    calendar(),
                );

            let report = sweep.execute().await.unwrap();
            assert_eq!(report.skipped, 1);
            assert_eq!(report.resolved, 0);
        }
    }

    mod expired_punishments {
        use super::*;

        #[tokio::test]
        async fn unsettled_players_are_penalised_and_punishment_closed() {
            let a = Profile::new("Klein", Role::Player, now())
                .with_vitals(Vitals::new(10, (5, 10), (5, 5), (5, 8)));
            let b = Profile::new("Audrey", Role::Player, now());
            let punishment = Punishment::new(
                "Cleanup duty",
                vec![RequiredTask {
                    kind: CodeKind::Action,
                    code_id: CodeId::new(),
                }],
                ResourceDelta::ZERO.with_sanity(2),
                EventMode::Individual,
                ProfileId::new(),
                now() - Duration::days(3),
            )
            .unwrap()
            .with_deadline(now() - Duration::hours(1));

            let unsettled = PunishmentPlayer::new(punishment.id(), a.id());
            let mut merciful = PunishmentPlayer::new(punishment.id(), b.id());
            merciful.grant_mercy(now() - Duration::days(1)).unwrap();
            let rows = vec![unsettled, merciful];

            let mut repo = MockPunishmentRepo::new();
            let listed = punishment.clone();
            repo.expect_list_overdue()
                .returning(move |_| Ok(vec![listed.clone()]));
            let all = rows.clone();
            repo.expect_list_players().returning(move |_| Ok(all.clone()));
            repo.expect_get_player()
                .returning(move |_, player| {
                    Ok(rows.iter().find(|r| r.player_id() == player).cloned())
                });
            let a_id = a.id();
            repo.expect_settle_player_with_profile()
                .withf(move |r, p| r.player_id() == a_id && p.vitals().sanity() == 3)
                .times(1)
                .returning(|_, _| Ok(TransitionOutcome::Applied));
            repo.expect_save()
                .withf(|p| !p.is_active())
                .times(1)
                .returning(|_| Ok(()));
            let punishments: Arc<dyn PunishmentRepo> = Arc::new(repo);

            let mut log = MockActivityLogRepo::new();
            log.expect_append()
                .withf(|l| l.actor_id.is_none())
                .returning(|_| Ok(()));
            let apply = Arc::new(ApplyPenalty::new(
                punishments.clone(),
                Arc::new(directory(vec![a, b])),
                Arc::new(log),
                Arc::new(quiet_notifier()),
                Arc::new(FixedClock(now())),
            ));
            let sweep =
                EnforceExpiredPunishments::new(punishments, apply, Arc::new(FixedClock(now())));

            let report = sweep.execute().await.unwrap();
            assert_eq!(report.resolved, 1);
            assert_eq!(report.failed, 0);
        }

        #[tokio::test]
        async fn failed_penalty_keeps_punishment_open_for_retry() {
            let player = Profile::new("Klein", Role::Player, now());
            let punishment = Punishment::new(
                "Cleanup duty",
                vec![RequiredTask {
                    kind: CodeKind::Action,
                    code_id: CodeId::new(),
                }],
                ResourceDelta::ZERO.with_sanity(2),
                EventMode::Individual,
                ProfileId::new(),
                now() - Duration::days(3),
            )
            .unwrap()
            .with_deadline(now() - Duration::hours(1));
            let row = PunishmentPlayer::new(punishment.id(), player.id());

            let mut repo = MockPunishmentRepo::new();
            let listed = punishment.clone();
            repo.expect_list_overdue()
                .returning(move |_| Ok(vec![listed.clone()]));
            let all = vec![row.clone()];
            repo.expect_list_players().returning(move |_| Ok(all.clone()));
            repo.expect_get_player()
                .returning(move |_, _| Ok(Some(row.clone())));
            repo.expect_settle_player_with_profile().returning(|_, _| {
                Err(RepoError::database("punishments.settle", "database is locked"))
            });
            repo.expect_save().times(0);
            let punishments: Arc<dyn PunishmentRepo> = Arc::new(repo);

            let apply = Arc::new(ApplyPenalty::new(
                punishments.clone(),
                Arc::new(directory(vec![player])),
                Arc::new(MockActivityLogRepo::new()),
                Arc::new(MockNotificationPort::new()),
                Arc::new(FixedClock(now())),
            ));
            let sweep =
                EnforceExpiredPunishments::new(punishments, apply, Arc::new(FixedClock(now())));

            let report = sweep.execute().await.unwrap();
            assert_eq!(report.failed, 1);
            assert_eq!(report.resolved, 0);
        }
    }
}
