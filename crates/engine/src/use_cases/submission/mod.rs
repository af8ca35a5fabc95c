//! Submission use cases.
//!
//! Players redeem action and quest codes, or ask for a night's sleep. Each
//! request lands as a pending [`Submission`] for staff review. Nothing here
//! touches resources; the approval resolver does that.

use std::sync::Arc;

use covenant_domain::{
    within_radius, CodeKind, Evidence, GameCalendar, LocationGate, MapToken, PolicyViolation,
    ProfileId, ShortCode, Submission, SubmissionKind,
};

mod codes;
mod lookup;

pub use codes::{ArchiveCode, CreateCode, CreateCodeInput, UpdateCode, UpdateCodeInput};
pub use lookup::FindPendingSubmission;

use super::UseCaseError;
use crate::infrastructure::ports::{ClockPort, CodeRepo, MapRepo, SubmissionRepo};

/// Container for submission use cases.
pub struct SubmissionUseCases {
    pub submit_code: Arc<SubmitCode>,
    pub submit_sleep: Arc<SubmitSleep>,
    pub find_pending: Arc<FindPendingSubmission>,
    pub create_code: Arc<CreateCode>,
    pub update_code: Arc<UpdateCode>,
    pub archive_code: Arc<ArchiveCode>,
}

impl SubmissionUseCases {
    pub fn new(
        submit_code: Arc<SubmitCode>,
        submit_sleep: Arc<SubmitSleep>,
        find_pending: Arc<FindPendingSubmission>,
        create_code: Arc<CreateCode>,
        update_code: Arc<UpdateCode>,
        archive_code: Arc<ArchiveCode>,
    ) -> Self {
        Self {
            submit_code,
            submit_sleep,
            find_pending,
            create_code,
            update_code,
            archive_code,
        }
    }
}

// =============================================================================
// Code redemption
// =============================================================================

#[derive(Debug, Clone)]
pub struct SubmitCodeInput {
    pub player_id: ProfileId,
    pub kind: CodeKind,
    pub code: String,
    pub evidence: Vec<String>,
}

/// Redeem an action or quest code.
///
/// Checks run in a fixed order so players see the most relevant refusal first:
/// code lookup, expiry, repeat limit, location gate, then evidence.
pub struct SubmitCode {
    codes: Arc<dyn CodeRepo>,
    submissions: Arc<dyn SubmissionRepo>,
    map: Arc<dyn MapRepo>,
    clock: Arc<dyn ClockPort>,
}

impl SubmitCode {
    pub fn new(
        codes: Arc<dyn CodeRepo>,
        submissions: Arc<dyn SubmissionRepo>,
        map: Arc<dyn MapRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            codes,
            submissions,
            map,
            clock,
        }
    }

    pub async fn execute(&self, input: SubmitCodeInput) -> Result<Submission, UseCaseError> {
        let short = ShortCode::new(&input.code)?;
        let entity = match input.kind {
            CodeKind::Action => "Action code",
            CodeKind::Quest => "Quest code",
        };

        // 1. Code exists, matches the kind, not archived
        let code = self
            .codes
            .get_by_code(short.as_str())
            .await?
            .filter(|code| code.kind() == input.kind)
            .ok_or_else(|| UseCaseError::not_found(entity, &short))?;

        // 2. Expiry
        let now = self.clock.now();
        if code.is_expired(now) {
            return Err(PolicyViolation::CodeExpired.into());
        }

        // 3. Repeat limit (rejected attempts don't count)
        if let Some(max) = code.max_repeats() {
            let used = self
                .submissions
                .count_non_rejected(input.player_id, code.id())
                .await?;
            if used >= max {
                return Err(PolicyViolation::RepeatLimitReached { used, max }.into());
            }
        }

        // 4. Location gate (quests only carry one)
        check_location_gate(self.map.as_ref(), input.player_id, code.gate()).await?;

        // 5. Evidence
        let evidence = Evidence::new(&input.evidence)?;

        let submission =
            Submission::for_code(code.kind(), input.player_id, code.id(), evidence, now);
        self.submissions.insert(&submission).await?;

        tracing::info!(
            submission_id = %submission.id(),
            player_id = %input.player_id,
            kind = %submission.kind(),
            code = %short,
            "Submission created"
        );
        Ok(submission)
    }
}

async fn check_location_gate(
    map: &dyn MapRepo,
    player: ProfileId,
    gate: &LocationGate,
) -> Result<(), UseCaseError> {
    if gate.is_empty() {
        return Ok(());
    }

    let token = map.get_player_token(player).await?;

    if let Some(required_map) = gate.map_id {
        if token.as_ref().map(|t| t.map_id) != Some(required_map) {
            return Err(PolicyViolation::NotInRequiredLocation.into());
        }
    }

    let Some(npc_id) = gate.npc_token_id else {
        return Ok(());
    };
    let Some(npc) = map.get_token(npc_id).await? else {
        tracing::debug!(npc_token_id = %npc_id, "Gate NPC token missing, skipping proximity check");
        return Ok(());
    };
    if !npc.gates_proximity() {
        return Ok(());
    }

    let player_token = token
        .filter(|t| t.map_id == npc.map_id)
        .ok_or(PolicyViolation::NotInRequiredLocation)?;
    if !within_radius(player_token.position, npc.position, npc.interaction_radius) {
        return Err(PolicyViolation::NotInRequiredRadius {
            distance: player_token.position.distance_to(&npc.position),
            radius: npc.interaction_radius,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Sleep requests
// =============================================================================

#[derive(Debug, Clone)]
pub struct SubmitSleepInput {
    pub player_id: ProfileId,
    pub meal_evidence: String,
    pub sleep_evidence: String,
}

/// Ask to sleep: one request per local calendar day, from inside a rest point.
pub struct SubmitSleep {
    submissions: Arc<dyn SubmissionRepo>,
    map: Arc<dyn MapRepo>,
    clock: Arc<dyn ClockPort>,
    calendar: GameCalendar,
}

impl SubmitSleep {
    pub fn new(
        submissions: Arc<dyn SubmissionRepo>,
        map: Arc<dyn MapRepo>,
        clock: Arc<dyn ClockPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            submissions,
            map,
            clock,
            calendar,
        }
    }

    pub async fn execute(&self, input: SubmitSleepInput) -> Result<Submission, UseCaseError> {
        // 1. Standing inside a rest point on the current map
        let token = self
            .map
            .get_player_token(input.player_id)
            .await?
            .ok_or(PolicyViolation::NotInRequiredLocation)?;
        self.ensure_at_rest_point(&token).await?;

        // 2. Once per local day, whatever became of earlier requests
        let now = self.clock.now();
        let today = self.calendar.start_of_day(now);
        let already = self
            .submissions
            .count_since(input.player_id, SubmissionKind::Sleep, today)
            .await?;
        if already > 0 {
            return Err(PolicyViolation::AlreadySubmittedToday.into());
        }

        // 3. Meal and sleep evidence
        if input.meal_evidence.trim().is_empty() || input.sleep_evidence.trim().is_empty() {
            return Err(UseCaseError::validation(
                "meal and sleep evidence are both required",
            ));
        }
        let evidence = Evidence::with_minimum([input.meal_evidence, input.sleep_evidence], 2)?;

        let submission = Submission::sleep(input.player_id, evidence, now);
        self.submissions.insert(&submission).await?;

        tracing::info!(
            submission_id = %submission.id(),
            player_id = %input.player_id,
            "Sleep request created"
        );
        Ok(submission)
    }

    async fn ensure_at_rest_point(&self, token: &MapToken) -> Result<(), UseCaseError> {
        let landmarks = self.map.list_landmarks(token.map_id).await?;
        let inside = landmarks
            .iter()
            .any(|l| l.is_rest_point() && l.contains(token.position));
        if inside {
            Ok(())
        } else {
            Err(PolicyViolation::NotNearRestPoint.into())
        }
    }
}
