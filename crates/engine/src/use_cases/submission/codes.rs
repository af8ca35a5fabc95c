//! Staff authoring of action and quest codes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use covenant_domain::{
    Code, CodeId, CodeKind, CodeRevision, GameCalendar, LocationGate, MapId, ProfileId,
    ResourceDelta, ShortCode, TokenId, SHORT_CODE_ATTEMPTS, SHORT_CODE_LETTERS,
};

use crate::infrastructure::ports::{
    ClockPort, CodeRepo, MapRepo, ProfileRepo, RandomPort, RepoError,
};
use crate::use_cases::shared::require_staff;
use crate::use_cases::UseCaseError;

#[derive(Debug, Clone)]
pub struct CreateCodeInput {
    pub actor_id: ProfileId,
    pub kind: CodeKind,
    pub name: String,
    pub reward: ResourceDelta,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_repeats: Option<u32>,
    pub map_id: Option<MapId>,
    pub npc_token_id: Option<TokenId>,
}

/// Builds a quest's location gate. A named NPC must exist with a working
/// radius, and its map replaces whatever map was given.
async fn resolve_gate(
    map: &dyn MapRepo,
    map_id: Option<MapId>,
    npc_token_id: Option<TokenId>,
) -> Result<LocationGate, UseCaseError> {
    let Some(token_id) = npc_token_id else {
        return Ok(LocationGate {
            map_id,
            npc_token_id: None,
        });
    };
    let npc = map
        .get_token(token_id)
        .await?
        .filter(|t| t.player_id().is_none())
        .ok_or_else(|| UseCaseError::not_found("NPC token", token_id))?;
    if !npc.gates_proximity() {
        return Err(UseCaseError::validation(
            "NPC has no interaction radius; set one on the map first",
        ));
    }
    Ok(LocationGate {
        map_id: Some(npc.map_id),
        npc_token_id: Some(token_id),
    })
}

/// Create a code with a generated `dd-mm-yy-abcd` short code.
pub struct CreateCode {
    codes: Arc<dyn CodeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    map: Arc<dyn MapRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    calendar: GameCalendar,
}

impl CreateCode {
    pub fn new(
        codes: Arc<dyn CodeRepo>,
        profiles: Arc<dyn ProfileRepo>,
        map: Arc<dyn MapRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        calendar: GameCalendar,
    ) -> Self {
        Self {
            codes,
            profiles,
            map,
            clock,
            random,
            calendar,
        }
    }

    pub async fn execute(&self, input: CreateCodeInput) -> Result<Code, UseCaseError> {
        let actor = require_staff(self.profiles.as_ref(), input.actor_id).await?;
        let gate = match input.kind {
            CodeKind::Quest => {
                resolve_gate(self.map.as_ref(), input.map_id, input.npc_token_id).await?
            }
            CodeKind::Action => LocationGate {
                map_id: input.map_id,
                npc_token_id: input.npc_token_id,
            },
        };
        let now = self.clock.now();
        let short = self.unique_short_code(now).await?;

        let mut code = Code::new(
            input.kind,
            input.name,
            short,
            input.reward,
            actor.id(),
            now,
        )?
        .with_gate(gate)?;
        if let Some(max_repeats) = input.max_repeats {
            code = code.with_max_repeats(max_repeats)?;
        }
        if let Some(expires_at) = input.expires_at {
            code = code.with_expiry(expires_at);
        }

        self.codes.save(&code).await?;
        tracing::info!(
            code_id = %code.id(),
            code = %code.code(),
            kind = code.kind().as_str(),
            actor_id = %actor.id(),
            "Code created"
        );
        Ok(code)
    }

    async fn unique_short_code(&self, now: DateTime<Utc>) -> Result<ShortCode, UseCaseError> {
        let date = self.calendar.local_date(now);
        for attempt in 1..=SHORT_CODE_ATTEMPTS {
            let mut letters = [0u8; SHORT_CODE_LETTERS];
            for letter in letters.iter_mut() {
                *letter = u8::try_from(self.random.gen_range(0, 25)).unwrap_or(0);
            }
            let candidate = ShortCode::generate(date, letters);
            if !self.codes.code_exists(candidate.as_str()).await? {
                return Ok(candidate);
            }
            tracing::debug!(attempt, code = %candidate, "Short code collision, retrying");
        }
        Err(UseCaseError::Persistence(RepoError::constraint(
            "could not generate a unique code",
        )))
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCodeInput {
    pub actor_id: ProfileId,
    pub code_id: CodeId,
    pub name: String,
    /// `None` keeps the current reward.
    pub reward: Option<ResourceDelta>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_repeats: Option<u32>,
    pub map_id: Option<MapId>,
    pub npc_token_id: Option<TokenId>,
}

/// Staff edit of an existing code. The short code never changes.
pub struct UpdateCode {
    codes: Arc<dyn CodeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    map: Arc<dyn MapRepo>,
}

impl UpdateCode {
    pub fn new(
        codes: Arc<dyn CodeRepo>,
        profiles: Arc<dyn ProfileRepo>,
        map: Arc<dyn MapRepo>,
    ) -> Self {
        Self {
            codes,
            profiles,
            map,
        }
    }

    pub async fn execute(&self, input: UpdateCodeInput) -> Result<Code, UseCaseError> {
        let actor = require_staff(self.profiles.as_ref(), input.actor_id).await?;
        let mut code = self
            .codes
            .get(input.code_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Code", input.code_id))?;

        let gate = match code.kind() {
            CodeKind::Quest => {
                resolve_gate(self.map.as_ref(), input.map_id, input.npc_token_id).await?
            }
            CodeKind::Action => LocationGate {
                map_id: input.map_id,
                npc_token_id: input.npc_token_id,
            },
        };
        code.revise(CodeRevision {
            name: input.name,
            reward: input.reward,
            expires_at: input.expires_at,
            max_repeats: input.max_repeats,
            gate,
        })?;

        self.codes.save(&code).await?;
        tracing::info!(
            code_id = %code.id(),
            kind = code.kind().as_str(),
            actor_id = %actor.id(),
            "Code updated"
        );
        Ok(code)
    }
}

/// Soft-delete a code. Pending submissions against it still resolve.
pub struct ArchiveCode {
    codes: Arc<dyn CodeRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl ArchiveCode {
    pub fn new(codes: Arc<dyn CodeRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { codes, profiles }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        code_id: CodeId,
    ) -> Result<Code, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let mut code = self
            .codes
            .get(code_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Code", code_id))?;

        if code.archive() {
            self.codes.save(&code).await?;
            tracing::info!(code_id = %code_id, actor_id = %actor_id, "Code archived");
        }
        Ok(code)
    }
}
