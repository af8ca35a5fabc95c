//! Repository port traits for database access.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use covenant_domain::*;

use super::error::RepoError;
use super::types::TransitionOutcome;

// =============================================================================
// Profiles
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get(&self, id: ProfileId) -> Result<Option<Profile>, RepoError>;
    async fn save(&self, profile: &Profile) -> Result<(), RepoError>;
    async fn count(&self) -> Result<u32, RepoError>;
}

// =============================================================================
// Codes
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeRepo: Send + Sync {
    /// Fetch by id, archived codes included (in-flight submissions still resolve).
    async fn get(&self, id: CodeId) -> Result<Option<Code>, RepoError>;
    /// Fetch a non-archived code by its short code.
    async fn get_by_code(&self, code: &str) -> Result<Option<Code>, RepoError>;
    /// Whether any code, archived or not, already uses this short code.
    async fn code_exists(&self, code: &str) -> Result<bool, RepoError>;
    async fn save(&self, code: &Code) -> Result<(), RepoError>;
}

// =============================================================================
// Submissions
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    async fn insert(&self, submission: &Submission) -> Result<(), RepoError>;
    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, RepoError>;

    // Lookup
    async fn get_pending(
        &self,
        kind: SubmissionKind,
        id: SubmissionId,
    ) -> Result<Option<Submission>, RepoError>;
    /// Oldest pending submission of `kind` whose id starts with `prefix`.
    async fn find_pending_by_prefix(
        &self,
        kind: SubmissionKind,
        prefix: &str,
    ) -> Result<Option<Submission>, RepoError>;
    async fn list_pending_created_before(
        &self,
        kind: SubmissionKind,
        before: DateTime<Utc>,
    ) -> Result<Vec<Submission>, RepoError>;

    // Counters
    async fn count_non_rejected(&self, player: ProfileId, code: CodeId)
        -> Result<u32, RepoError>;
    /// Submissions of `kind` by `player` created at or after `since`, any status.
    async fn count_since(
        &self,
        player: ProfileId,
        kind: SubmissionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, RepoError>;
    /// Whether any of `players` has an approved submission against `code`
    /// created at or after `since`.
    async fn has_approved_since(
        &self,
        players: &[ProfileId],
        code: CodeId,
        since: DateTime<Utc>,
    ) -> Result<bool, RepoError>;

    // Conditional transitions (only applied while the stored row is still pending)
    async fn resolve(&self, submission: &Submission) -> Result<TransitionOutcome, RepoError>;
    /// Transition plus the rewarded profile, in one transaction.
    async fn resolve_with_profile(
        &self,
        submission: &Submission,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError>;
}

// =============================================================================
// Skills
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn get(&self, id: SkillId) -> Result<Option<Skill>, RepoError>;
    async fn save(&self, skill: &Skill) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrantedSkillRepo: Send + Sync {
    async fn get(&self, id: GrantedSkillId) -> Result<Option<GrantedSkill>, RepoError>;
    async fn save(&self, grant: &GrantedSkill) -> Result<(), RepoError>;
    /// Persists a cast: the grant's new usage and the caster's profile, in one
    /// transaction, only if the stored row still belongs to the caster and its
    /// `times_used` still equals `expected_times_used`.
    async fn commit_use(
        &self,
        grant: &GrantedSkill,
        expected_times_used: u32,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError>;
    /// Persists a transfer only if the stored row is still owned by
    /// `previous_owner` with `expected_times_used` uses.
    async fn commit_transfer(
        &self,
        grant: &GrantedSkill,
        previous_owner: ProfileId,
        expected_times_used: u32,
    ) -> Result<TransitionOutcome, RepoError>;
}

// =============================================================================
// Punishments
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PunishmentRepo: Send + Sync {
    async fn insert(
        &self,
        punishment: &Punishment,
        players: &[PunishmentPlayer],
    ) -> Result<(), RepoError>;
    async fn get(&self, id: PunishmentId) -> Result<Option<Punishment>, RepoError>;
    async fn save(&self, punishment: &Punishment) -> Result<(), RepoError>;

    async fn list_players(&self, id: PunishmentId) -> Result<Vec<PunishmentPlayer>, RepoError>;
    async fn get_player(
        &self,
        id: PunishmentId,
        player: ProfileId,
    ) -> Result<Option<PunishmentPlayer>, RepoError>;
    /// Active, non-archived punishments whose deadline is before `now`.
    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Punishment>, RepoError>;

    // Conditional settlement (only applied while neither mercy nor penalty is recorded)
    async fn settle_player(&self, row: &PunishmentPlayer) -> Result<TransitionOutcome, RepoError>;
    async fn settle_player_with_profile(
        &self,
        row: &PunishmentPlayer,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError>;
}

// =============================================================================
// Roleplay review
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleplayRepo: Send + Sync {
    /// Stores the submission and its links. A second submission for the same
    /// player and day fails with a constraint violation.
    async fn insert(&self, submission: &RoleplaySubmission) -> Result<(), RepoError>;
    async fn exists_for_day(&self, player: ProfileId, day: NaiveDate) -> Result<bool, RepoError>;
    async fn get_link(&self, id: RoleplayLinkId) -> Result<Option<RoleplayLink>, RepoError>;
    /// Review plus the player's profile, in one transaction, only while the
    /// stored link is still unreviewed.
    async fn review_link_with_profile(
        &self,
        link: &RoleplayLink,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError>;
}

// =============================================================================
// Map placement
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapRepo: Send + Sync {
    async fn get_player_token(&self, player: ProfileId) -> Result<Option<MapToken>, RepoError>;
    async fn get_token(&self, id: TokenId) -> Result<Option<MapToken>, RepoError>;
    async fn list_landmarks(&self, map: MapId) -> Result<Vec<Landmark>, RepoError>;
    async fn save_token(&self, token: &MapToken) -> Result<(), RepoError>;
    async fn save_landmark(&self, landmark: &Landmark) -> Result<(), RepoError>;
}

// =============================================================================
// Audit trail
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepo: Send + Sync {
    async fn append(&self, entry: &ActivityLog) -> Result<(), RepoError>;
    /// Newest first.
    async fn list_for_player(
        &self,
        player: ProfileId,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, RepoError>;
}
