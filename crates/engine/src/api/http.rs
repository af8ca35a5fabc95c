//! HTTP routes.
//!
//! Thin JSON adapters over the use cases. Actor and player ids arrive in the
//! request body; authentication lives in front of this service.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use covenant_domain::{
    ActivityLog, Code, CodeId, CodeKind, DigestLevel, EventMode, GrantedSkill, GrantedSkillId,
    Landmark, LandmarkId, LandmarkKind, LedgerChange, MapId, MapPoint, MapToken, PathwayId,
    Profile, ProfileId, Punishment, PunishmentChanges, PunishmentId, PunishmentPlayer,
    ReligionId, RequiredTask, ResourceDelta, ReusePolicy, Role, RoleplayLink, RoleplayLinkId,
    RoleplaySubmission, Skill, SkillEffects, SkillId, Submission, SubmissionId, TokenId, Vitals,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::App;
use crate::use_cases::admin::{CreateSkillInput, PlayerUpdate};
use crate::use_cases::punishment::AssignPunishmentInput;
use crate::use_cases::skill_cast::{CastOutcome, GrantSkillInput};
use crate::use_cases::submission::{
    CreateCodeInput, SubmitCodeInput, SubmitSleepInput, UpdateCodeInput,
};
use crate::use_cases::UseCaseError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/api/health", get(health))
        // Codes and submissions
        .route("/api/codes", post(create_code))
        .route("/api/codes/{id}", put(update_code))
        .route("/api/codes/{id}/archive", post(archive_code))
        .route("/api/submissions", post(submit_code))
        .route("/api/sleep", post(submit_sleep))
        .route("/api/submissions/pending/{prefix}", get(find_pending))
        .route("/api/submissions/{id}/approve", post(approve_submission))
        .route("/api/submissions/{id}/reject", post(reject_submission))
        // Skills
        .route("/api/skills/{id}/cast", post(cast_pathway_skill))
        .route("/api/granted-skills", post(grant_skill))
        .route("/api/granted-skills/{id}/cast", post(cast_granted_skill))
        .route("/api/granted-skills/{id}/transfer", post(transfer_granted_skill))
        // Punishments
        .route("/api/punishments", post(assign_punishment))
        .route("/api/punishments/{id}", put(update_punishment))
        .route("/api/punishments/{id}/archive", post(archive_punishment))
        .route(
            "/api/punishments/{id}/completion/{player}",
            get(check_completion),
        )
        .route("/api/punishments/{id}/mercy", post(request_mercy))
        .route("/api/punishments/{id}/penalty", post(apply_penalty))
        .route("/api/prayers", post(pray))
        // Roleplay
        .route("/api/roleplay", post(submit_roleplay))
        .route("/api/roleplay/links/{id}/review", post(review_roleplay_link))
        // Profiles and seeding
        .route("/api/profiles", post(register_profile))
        .route("/api/profiles/{id}", put(update_player))
        .route("/api/profiles/{id}/religion", put(set_religion))
        .route("/api/profiles/{id}/promote", post(promote_sequence))
        .route("/api/profiles/{id}/activity", get(list_activity))
        .route("/api/skills", post(create_skill))
        .route("/api/maps/{id}/players", post(place_player_token))
        .route("/api/maps/{id}/npcs", post(add_npc_token))
        .route("/api/maps/{id}/landmarks", post(add_landmark))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRequest {
    actor_id: ProfileId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCodeRequest {
    actor_id: ProfileId,
    kind: CodeKind,
    name: String,
    #[serde(default)]
    reward: ResourceDelta,
    expires_at: Option<DateTime<Utc>>,
    max_repeats: Option<u32>,
    map_id: Option<MapId>,
    npc_token_id: Option<TokenId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCodeRequest {
    actor_id: ProfileId,
    name: String,
    reward: Option<ResourceDelta>,
    expires_at: Option<DateTime<Utc>>,
    max_repeats: Option<u32>,
    map_id: Option<MapId>,
    npc_token_id: Option<TokenId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitCodeRequest {
    player_id: ProfileId,
    kind: CodeKind,
    code: String,
    #[serde(default)]
    evidence: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitSleepRequest {
    player_id: ProfileId,
    #[serde(default)]
    meal_evidence: String,
    #[serde(default)]
    sleep_evidence: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    reviewer_id: ProfileId,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalResponse {
    submission: Submission,
    change: LedgerChange,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CastRequest {
    player_id: ProfileId,
    threshold: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CastResponse {
    reference: String,
    roll: i32,
    threshold: i32,
    success: bool,
    spirit_cost: i32,
    change: LedgerChange,
}

impl From<CastOutcome> for CastResponse {
    fn from(outcome: CastOutcome) -> Self {
        Self {
            reference: outcome.reference.to_string(),
            roll: outcome.roll,
            threshold: outcome.threshold,
            success: outcome.success,
            spirit_cost: outcome.spirit_cost,
            change: outcome.change,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantSkillRequest {
    actor_id: ProfileId,
    player_id: ProfileId,
    skill_id: SkillId,
    title: String,
    detail: Option<String>,
    #[serde(flatten)]
    reuse_policy: ReusePolicy,
    #[serde(default)]
    effects: SkillEffects,
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    transferable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    owner_id: ProfileId,
    target_id: ProfileId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignPunishmentRequest {
    actor_id: ProfileId,
    name: String,
    description: Option<String>,
    tasks: Vec<RequiredTask>,
    players: Vec<ProfileId>,
    #[serde(default)]
    penalty: ResourceDelta,
    deadline: Option<DateTime<Utc>>,
    mode: EventMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePunishmentRequest {
    actor_id: ProfileId,
    name: Option<String>,
    description: Option<String>,
    penalty: Option<ResourceDelta>,
    deadline: Option<DateTime<Utc>>,
    /// Removes the deadline; wins over `deadline`.
    #[serde(default)]
    clear_deadline: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRequest {
    player_id: ProfileId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PenaltyRequest {
    actor_id: ProfileId,
    player_id: ProfileId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PenaltyResponse {
    assignment: PunishmentPlayer,
    vitals: Vitals,
}

#[derive(Debug, Serialize)]
struct CompletionResponse {
    complete: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrayerRequest {
    player_id: ProfileId,
    #[serde(default)]
    evidence: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrayerResponse {
    landmark_id: LandmarkId,
    sanity_gained: i32,
    change: LedgerChange,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleplayRequest {
    player_id: ProfileId,
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkReviewRequest {
    reviewer_id: ProfileId,
    level: DigestLevel,
    note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkReviewResponse {
    link: RoleplayLink,
    digest_progress: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlayerRequest {
    actor_id: ProfileId,
    display_name: Option<String>,
    role: Option<Role>,
    #[serde(default)]
    hp_delta: i32,
    #[serde(default)]
    sanity_delta: i32,
    max_sanity: Option<i32>,
    spirit: Option<i32>,
    max_spirit: Option<i32>,
    travel: Option<i32>,
    max_travel: Option<i32>,
    pathway_id: Option<PathwayId>,
    sequence: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReligionRequest {
    religion_id: Option<ReligionId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSkillRequest {
    actor_id: ProfileId,
    name: String,
    description: Option<String>,
    pathway_id: PathwayId,
    sequence: u8,
    #[serde(default)]
    spirit_cost: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceTokenRequest {
    actor_id: ProfileId,
    player_id: ProfileId,
    position: Option<MapPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NpcRequest {
    actor_id: ProfileId,
    name: String,
    #[serde(default)]
    radius: f64,
    position: Option<MapPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LandmarkRequest {
    actor_id: ProfileId,
    name: String,
    kind: LandmarkKind,
    radius: f64,
    position: Option<MapPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityQuery {
    actor_id: ProfileId,
    limit: Option<u32>,
}

// =============================================================================
// Codes and submissions
// =============================================================================

async fn create_code(
    State(app): State<Arc<App>>,
    Json(req): Json<CreateCodeRequest>,
) -> Result<(StatusCode, Json<Code>), ApiError> {
    let code = app
        .use_cases
        .submission
        .create_code
        .execute(CreateCodeInput {
            actor_id: req.actor_id,
            kind: req.kind,
            name: req.name,
            reward: req.reward,
            expires_at: req.expires_at,
            max_repeats: req.max_repeats,
            map_id: req.map_id,
            npc_token_id: req.npc_token_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(code)))
}

async fn update_code(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCodeRequest>,
) -> Result<Json<Code>, ApiError> {
    let code = app
        .use_cases
        .submission
        .update_code
        .execute(UpdateCodeInput {
            actor_id: req.actor_id,
            code_id: CodeId::from_uuid(id),
            name: req.name,
            reward: req.reward,
            expires_at: req.expires_at,
            max_repeats: req.max_repeats,
            map_id: req.map_id,
            npc_token_id: req.npc_token_id,
        })
        .await?;
    Ok(Json(code))
}

async fn archive_code(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Code>, ApiError> {
    let code = app
        .use_cases
        .submission
        .archive_code
        .execute(req.actor_id, CodeId::from_uuid(id))
        .await?;
    Ok(Json(code))
}

async fn submit_code(
    State(app): State<Arc<App>>,
    Json(req): Json<SubmitCodeRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let submission = app
        .use_cases
        .submission
        .submit_code
        .execute(SubmitCodeInput {
            player_id: req.player_id,
            kind: req.kind,
            code: req.code,
            evidence: req.evidence,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn submit_sleep(
    State(app): State<Arc<App>>,
    Json(req): Json<SubmitSleepRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let submission = app
        .use_cases
        .submission
        .submit_sleep
        .execute(SubmitSleepInput {
            player_id: req.player_id,
            meal_evidence: req.meal_evidence,
            sleep_evidence: req.sleep_evidence,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn find_pending(
    State(app): State<Arc<App>>,
    Path(prefix): Path<String>,
) -> Result<Json<Submission>, ApiError> {
    let submission = app
        .use_cases
        .submission
        .find_pending
        .execute(&prefix)
        .await?
        .ok_or_else(|| UseCaseError::not_found("Pending submission", &prefix))?;
    Ok(Json(submission))
}

async fn approve_submission(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let result = app
        .use_cases
        .approval
        .approve
        .execute(req.reviewer_id, SubmissionId::from_uuid(id))
        .await?;
    Ok(Json(ApprovalResponse {
        submission: result.submission,
        change: result.change,
    }))
}

async fn reject_submission(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Submission>, ApiError> {
    let submission = app
        .use_cases
        .approval
        .reject
        .execute(req.reviewer_id, SubmissionId::from_uuid(id), req.reason)
        .await?;
    Ok(Json(submission))
}

// =============================================================================
// Skills
// =============================================================================

async fn cast_pathway_skill(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CastRequest>,
) -> Result<Json<CastResponse>, ApiError> {
    let outcome = app
        .use_cases
        .skill
        .cast_pathway
        .execute(req.player_id, SkillId::from_uuid(id), req.threshold)
        .await?;
    Ok(Json(outcome.into()))
}

async fn grant_skill(
    State(app): State<Arc<App>>,
    Json(req): Json<GrantSkillRequest>,
) -> Result<(StatusCode, Json<GrantedSkill>), ApiError> {
    let grant = app
        .use_cases
        .skill
        .grant
        .execute(GrantSkillInput {
            actor_id: req.actor_id,
            player_id: req.player_id,
            skill_id: req.skill_id,
            title: req.title,
            detail: req.detail,
            reuse_policy: req.reuse_policy,
            effects: req.effects,
            expires_at: req.expires_at,
            transferable: req.transferable,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

async fn cast_granted_skill(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CastRequest>,
) -> Result<Json<CastResponse>, ApiError> {
    let outcome = app
        .use_cases
        .skill
        .cast_granted
        .execute(req.player_id, GrantedSkillId::from_uuid(id), req.threshold)
        .await?;
    Ok(Json(outcome.into()))
}

async fn transfer_granted_skill(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<GrantedSkill>, ApiError> {
    let grant = app
        .use_cases
        .skill
        .transfer
        .execute(req.owner_id, GrantedSkillId::from_uuid(id), req.target_id)
        .await?;
    Ok(Json(grant))
}

// =============================================================================
// Punishments
// =============================================================================

async fn assign_punishment(
    State(app): State<Arc<App>>,
    Json(req): Json<AssignPunishmentRequest>,
) -> Result<(StatusCode, Json<Punishment>), ApiError> {
    let punishment = app
        .use_cases
        .punishment
        .assign
        .execute(AssignPunishmentInput {
            actor_id: req.actor_id,
            name: req.name,
            description: req.description,
            tasks: req.tasks,
            players: req.players,
            penalty: req.penalty,
            deadline: req.deadline,
            mode: req.mode,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(punishment)))
}

async fn update_punishment(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePunishmentRequest>,
) -> Result<Json<Punishment>, ApiError> {
    let deadline = if req.clear_deadline {
        Some(None)
    } else {
        req.deadline.map(Some)
    };
    let punishment = app
        .use_cases
        .punishment
        .update
        .execute(
            req.actor_id,
            PunishmentId::from_uuid(id),
            PunishmentChanges {
                name: req.name,
                description: req.description,
                penalty: req.penalty,
                deadline,
            },
        )
        .await?;
    Ok(Json(punishment))
}

async fn archive_punishment(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Punishment>, ApiError> {
    let punishment = app
        .use_cases
        .punishment
        .archive
        .execute(req.actor_id, PunishmentId::from_uuid(id))
        .await?;
    Ok(Json(punishment))
}

async fn check_completion(
    State(app): State<Arc<App>>,
    Path((id, player)): Path<(Uuid, Uuid)>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let complete = app
        .use_cases
        .punishment
        .check_completion
        .execute(PunishmentId::from_uuid(id), ProfileId::from_uuid(player))
        .await?;
    Ok(Json(CompletionResponse { complete }))
}

async fn request_mercy(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<PunishmentPlayer>, ApiError> {
    let row = app
        .use_cases
        .punishment
        .request_mercy
        .execute(PunishmentId::from_uuid(id), req.player_id)
        .await?;
    Ok(Json(row))
}

async fn apply_penalty(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PenaltyRequest>,
) -> Result<Json<PenaltyResponse>, ApiError> {
    let outcome = app
        .use_cases
        .punishment
        .apply_penalty
        .execute(req.actor_id, PunishmentId::from_uuid(id), req.player_id)
        .await?;
    Ok(Json(PenaltyResponse {
        assignment: outcome.row,
        vitals: outcome.profile.vitals(),
    }))
}

async fn pray(
    State(app): State<Arc<App>>,
    Json(req): Json<PrayerRequest>,
) -> Result<Json<PrayerResponse>, ApiError> {
    let outcome = app
        .use_cases
        .prayer
        .execute(req.player_id, req.evidence)
        .await?;
    Ok(Json(PrayerResponse {
        landmark_id: outcome.landmark_id,
        sanity_gained: outcome.sanity_gained,
        change: outcome.change,
    }))
}

// =============================================================================
// Roleplay
// =============================================================================

async fn submit_roleplay(
    State(app): State<Arc<App>>,
    Json(req): Json<RoleplayRequest>,
) -> Result<(StatusCode, Json<RoleplaySubmission>), ApiError> {
    let submission = app
        .use_cases
        .roleplay
        .submit
        .execute(req.player_id, req.urls)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn review_roleplay_link(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkReviewRequest>,
) -> Result<Json<LinkReviewResponse>, ApiError> {
    let outcome = app
        .use_cases
        .roleplay
        .review
        .execute(
            req.reviewer_id,
            RoleplayLinkId::from_uuid(id),
            req.level,
            &req.note,
        )
        .await?;
    Ok(Json(LinkReviewResponse {
        link: outcome.link,
        digest_progress: outcome.digest_progress,
    }))
}

async fn promote_sequence(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    let profile = app
        .use_cases
        .roleplay
        .promote
        .execute(ProfileId::from_uuid(id))
        .await?;
    Ok(Json(profile))
}

// =============================================================================
// Profiles and seeding
// =============================================================================

async fn register_profile(
    State(app): State<Arc<App>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let profile = app
        .use_cases
        .admin
        .register
        .execute(&req.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn update_player(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlayerRequest>,
) -> Result<Json<Profile>, ApiError> {
    let pathway = match (req.pathway_id, req.sequence) {
        (Some(pathway), Some(sequence)) => Some((pathway, sequence)),
        (None, None) => None,
        _ => {
            return Err(UseCaseError::validation("Pathway and sequence go together").into());
        }
    };
    let profile = app
        .use_cases
        .admin
        .update_player
        .execute(
            req.actor_id,
            ProfileId::from_uuid(id),
            PlayerUpdate {
                display_name: req.display_name,
                role: req.role,
                hp_delta: req.hp_delta,
                sanity_delta: req.sanity_delta,
                max_sanity: req.max_sanity,
                spirit: req.spirit,
                max_spirit: req.max_spirit,
                travel: req.travel,
                max_travel: req.max_travel,
                pathway,
            },
        )
        .await?;
    Ok(Json(profile))
}

async fn set_religion(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReligionRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = app
        .use_cases
        .admin
        .set_religion
        .execute(ProfileId::from_uuid(id), req.religion_id)
        .await?;
    Ok(Json(profile))
}

async fn list_activity(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let entries = app
        .use_cases
        .admin
        .list_activity
        .execute(query.actor_id, ProfileId::from_uuid(id), query.limit)
        .await?;
    Ok(Json(entries))
}

async fn create_skill(
    State(app): State<Arc<App>>,
    Json(req): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    let skill = app
        .use_cases
        .admin
        .create_skill
        .execute(CreateSkillInput {
            actor_id: req.actor_id,
            name: req.name,
            description: req.description,
            pathway_id: req.pathway_id,
            sequence: req.sequence,
            spirit_cost: req.spirit_cost,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn place_player_token(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PlaceTokenRequest>,
) -> Result<(StatusCode, Json<MapToken>), ApiError> {
    let token = app
        .use_cases
        .admin
        .place_token
        .execute(req.actor_id, req.player_id, MapId::from_uuid(id), req.position)
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

async fn add_npc_token(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<NpcRequest>,
) -> Result<(StatusCode, Json<MapToken>), ApiError> {
    let token = app
        .use_cases
        .admin
        .add_npc
        .execute(
            req.actor_id,
            MapId::from_uuid(id),
            &req.name,
            req.radius,
            req.position,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

async fn add_landmark(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LandmarkRequest>,
) -> Result<(StatusCode, Json<Landmark>), ApiError> {
    let landmark = app
        .use_cases
        .admin
        .add_landmark
        .execute(
            req.actor_id,
            MapId::from_uuid(id),
            &req.name,
            req.kind,
            req.radius,
            req.position,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(landmark)))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// A use-case failure on its way out as JSON.
#[derive(Debug)]
pub struct ApiError(UseCaseError);

impl From<UseCaseError> for ApiError {
    fn from(err: UseCaseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            UseCaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UseCaseError::NotFound { .. } => StatusCode::NOT_FOUND,
            UseCaseError::AlreadyResolved(_) => StatusCode::CONFLICT,
            UseCaseError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UseCaseError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Store details stay in the log.
        let message = match &self.0 {
            UseCaseError::Persistence(e) => {
                tracing::error!(error = %e, "Request failed in the store");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                kind: self.0.kind(),
                message,
            }),
        )
            .into_response()
    }
}
