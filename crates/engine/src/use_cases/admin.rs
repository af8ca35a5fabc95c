//! Staff seeding and profile management.
//!
//! Everything the other workflows read has to be put there first: profiles,
//! skill definitions, map tokens and landmarks. Most of it is staff-only;
//! players may register, choose a religion and place their own first token.

use std::sync::Arc;

use covenant_domain::{
    ActivityEntry, ActivityLog, Landmark, LandmarkKind, MapId, MapPoint, MapToken, PathwayId,
    Profile, ProfileId, ReligionId, ResourceDelta, Role, Skill, Vitals,
};

use super::shared::{load_profile, record_activity, require_staff};
use super::UseCaseError;
use crate::infrastructure::ports::{ActivityLogRepo, ClockPort, MapRepo, ProfileRepo, SkillRepo};

/// Where new tokens and landmarks land when no position is given.
pub const DEFAULT_POSITION: MapPoint = MapPoint { x: 50.0, y: 50.0 };

/// NPC interaction radius bounds, in map percent.
pub const MAX_NPC_RADIUS: f64 = 50.0;

/// Landmark radii are clamped into this range.
pub const LANDMARK_RADIUS: (f64, f64) = (1.0, 50.0);

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
pub const MAX_ACTIVITY_LIMIT: u32 = 200;

/// Container for admin use cases.
pub struct AdminUseCases {
    pub register: Arc<RegisterProfile>,
    pub update_player: Arc<UpdatePlayer>,
    pub set_religion: Arc<SetReligion>,
    pub create_skill: Arc<CreateSkill>,
    pub place_token: Arc<PlacePlayerToken>,
    pub add_npc: Arc<AddNpcToken>,
    pub add_landmark: Arc<AddLandmark>,
    pub list_activity: Arc<ListActivity>,
}

impl AdminUseCases {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        register: Arc<RegisterProfile>,
        update_player: Arc<UpdatePlayer>,
        set_religion: Arc<SetReligion>,
        create_skill: Arc<CreateSkill>,
        place_token: Arc<PlacePlayerToken>,
        add_npc: Arc<AddNpcToken>,
        add_landmark: Arc<AddLandmark>,
        list_activity: Arc<ListActivity>,
    ) -> Self {
        Self {
            register,
            update_player,
            set_religion,
            create_skill,
            place_token,
            add_npc,
            add_landmark,
            list_activity,
        }
    }
}

/// Refuses unless the actor is the player themself or staff.
async fn require_self_or_staff(
    profiles: &dyn ProfileRepo,
    actor_id: ProfileId,
    player_id: ProfileId,
) -> Result<Profile, UseCaseError> {
    if actor_id == player_id {
        return load_profile(profiles, actor_id).await;
    }
    require_staff(profiles, actor_id).await
}

// =============================================================================
// Profiles
// =============================================================================

/// Creates a profile. The first profile in an empty store becomes the owner.
pub struct RegisterProfile {
    profiles: Arc<dyn ProfileRepo>,
    clock: Arc<dyn ClockPort>,
}

impl RegisterProfile {
    pub fn new(profiles: Arc<dyn ProfileRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { profiles, clock }
    }

    pub async fn execute(&self, display_name: &str) -> Result<Profile, UseCaseError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(UseCaseError::validation("Display name cannot be empty"));
        }
        let role = if self.profiles.count().await? == 0 {
            Role::Owner
        } else {
            Role::Player
        };

        let profile = Profile::new(name, role, self.clock.now());
        self.profiles.save(&profile).await?;
        tracing::info!(profile_id = %profile.id(), role = role.as_str(), "Profile registered");
        Ok(profile)
    }
}

/// A staff edit of one player. Every field is optional; at least one must be set.
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    /// Added to current HP (floored at 0).
    pub hp_delta: i32,
    /// Added to current sanity (clamped to the max).
    pub sanity_delta: i32,
    pub max_sanity: Option<i32>,
    pub spirit: Option<i32>,
    pub max_spirit: Option<i32>,
    pub travel: Option<i32>,
    pub max_travel: Option<i32>,
    pub pathway: Option<(PathwayId, u8)>,
}

impl PlayerUpdate {
    fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.role.is_none()
            && self.hp_delta == 0
            && self.sanity_delta == 0
            && self.max_sanity.is_none()
            && self.spirit.is_none()
            && self.max_spirit.is_none()
            && self.travel.is_none()
            && self.max_travel.is_none()
            && self.pathway.is_none()
    }

    fn validate(&self) -> Result<(), UseCaseError> {
        let maxima = [self.max_sanity, self.max_spirit, self.max_travel];
        if maxima.iter().flatten().any(|m| *m < 1) {
            return Err(UseCaseError::validation("Resource maxima must be at least 1"));
        }
        if [self.spirit, self.travel].iter().flatten().any(|v| *v < 0) {
            return Err(UseCaseError::validation("Resource values cannot be negative"));
        }
        Ok(())
    }

    /// Absolute values first, so the sanity delta clamps against the new max.
    fn apply_to(&self, vitals: Vitals) -> Vitals {
        let absolute = Vitals::new(
            vitals.hp(),
            (
                vitals.sanity(),
                self.max_sanity.unwrap_or(vitals.max_sanity()),
            ),
            (
                self.travel.unwrap_or(vitals.travel()),
                self.max_travel.unwrap_or(vitals.max_travel()),
            ),
            (
                self.spirit.unwrap_or(vitals.spirit()),
                self.max_spirit.unwrap_or(vitals.max_spirit()),
            ),
        );
        covenant_domain::ledger::apply(
            absolute,
            &ResourceDelta::ZERO
                .with_hp(self.hp_delta)
                .with_sanity(self.sanity_delta),
        )
    }
}

pub struct UpdatePlayer {
    profiles: Arc<dyn ProfileRepo>,
    activity: Arc<dyn ActivityLogRepo>,
    clock: Arc<dyn ClockPort>,
}

impl UpdatePlayer {
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

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        player_id: ProfileId,
        update: PlayerUpdate,
    ) -> Result<Profile, UseCaseError> {
        let actor = require_staff(self.profiles.as_ref(), actor_id).await?;
        if update.is_empty() {
            return Err(UseCaseError::validation("No fields to update"));
        }
        update.validate()?;
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;

        if let Some(name) = &update.display_name {
            profile.rename(name)?;
        }
        if let Some(role) = update.role {
            profile.set_role(role);
        }
        if let Some((pathway, sequence)) = update.pathway {
            profile.set_pathway(pathway, sequence);
        }
        let change = profile.set_vitals(update.apply_to(profile.vitals()));

        self.profiles.save(&profile).await?;
        tracing::info!(player_id = %player_id, actor_id = %actor.id(), "Player updated");

        if change.before != change.after {
            record_activity(
                self.activity.as_ref(),
                ActivityLog::new(
                    player_id,
                    Some(actor.id()),
                    ActivityEntry::ProfileEdited {
                        before: change.before,
                        after: change.after,
                    },
                    self.clock.now(),
                ),
            )
            .await;
        }
        Ok(profile)
    }
}

/// Players pick, change or drop their own religion.
pub struct SetReligion {
    profiles: Arc<dyn ProfileRepo>,
}

impl SetReligion {
    pub fn new(profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { profiles }
    }

    pub async fn execute(
        &self,
        player_id: ProfileId,
        religion_id: Option<ReligionId>,
    ) -> Result<Profile, UseCaseError> {
        let mut profile = load_profile(self.profiles.as_ref(), player_id).await?;
        profile.set_religion(religion_id);
        self.profiles.save(&profile).await?;
        tracing::debug!(player_id = %player_id, ?religion_id, "Religion set");
        Ok(profile)
    }
}

// =============================================================================
// Skills
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreateSkillInput {
    pub actor_id: ProfileId,
    pub name: String,
    pub description: Option<String>,
    pub pathway_id: PathwayId,
    pub sequence: u8,
    pub spirit_cost: i32,
}

pub struct CreateSkill {
    skills: Arc<dyn SkillRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl CreateSkill {
    pub fn new(skills: Arc<dyn SkillRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { skills, profiles }
    }

    pub async fn execute(&self, input: CreateSkillInput) -> Result<Skill, UseCaseError> {
        require_staff(self.profiles.as_ref(), input.actor_id).await?;
        let mut skill = Skill::new(input.name, input.sequence, input.spirit_cost)?
            .with_pathway(input.pathway_id);
        if let Some(description) = input.description {
            skill = skill.with_description(description.trim());
        }

        self.skills.save(&skill).await?;
        tracing::info!(skill_id = %skill.id, sequence = skill.sequence, "Skill created");
        Ok(skill)
    }
}

// =============================================================================
// Map placement
// =============================================================================

/// Puts a player's token on a map. Players may only place themselves, and
/// only once; staff may place or move anyone.
pub struct PlacePlayerToken {
    map: Arc<dyn MapRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl PlacePlayerToken {
    pub fn new(map: Arc<dyn MapRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { map, profiles }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        player_id: ProfileId,
        map_id: MapId,
        position: Option<MapPoint>,
    ) -> Result<MapToken, UseCaseError> {
        let actor = require_self_or_staff(self.profiles.as_ref(), actor_id, player_id).await?;
        load_profile(self.profiles.as_ref(), player_id).await?;
        let position = position.unwrap_or(DEFAULT_POSITION);

        let token = match self.map.get_player_token(player_id).await? {
            Some(existing) if existing.map_id == map_id => {
                return Err(UseCaseError::validation("Player is already on this map"));
            }
            Some(_) if !actor.is_staff() => {
                return Err(UseCaseError::validation(
                    "Players move between maps by travelling, not by placement",
                ));
            }
            Some(mut existing) => {
                existing.map_id = map_id;
                existing.position = position;
                existing
            }
            None => MapToken::player(player_id, map_id, position),
        };

        self.map.save_token(&token).await?;
        tracing::info!(player_id = %player_id, map_id = %map_id, "Player token placed");
        Ok(token)
    }
}

pub struct AddNpcToken {
    map: Arc<dyn MapRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl AddNpcToken {
    pub fn new(map: Arc<dyn MapRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { map, profiles }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        map_id: MapId,
        name: &str,
        radius: f64,
        position: Option<MapPoint>,
    ) -> Result<MapToken, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(UseCaseError::validation("NPC name cannot be empty"));
        }
        if !(0.0..=MAX_NPC_RADIUS).contains(&radius) {
            return Err(UseCaseError::validation(format!(
                "NPC radius must be between 0 and {MAX_NPC_RADIUS}"
            )));
        }

        let token = MapToken::npc(name, map_id, position.unwrap_or(DEFAULT_POSITION), radius);
        self.map.save_token(&token).await?;
        tracing::info!(token_id = %token.id, map_id = %map_id, radius, "NPC token added");
        Ok(token)
    }
}

/// Adds a rest point or church. The radius is clamped rather than refused.
pub struct AddLandmark {
    map: Arc<dyn MapRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl AddLandmark {
    pub fn new(map: Arc<dyn MapRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { map, profiles }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        map_id: MapId,
        name: &str,
        kind: LandmarkKind,
        radius: f64,
        position: Option<MapPoint>,
    ) -> Result<Landmark, UseCaseError> {
        require_staff(self.profiles.as_ref(), actor_id).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(UseCaseError::validation("Landmark name cannot be empty"));
        }
        let (min, max) = LANDMARK_RADIUS;
        let radius = if radius.is_nan() { min } else { radius.clamp(min, max) };

        let landmark = Landmark::new(
            name,
            map_id,
            kind,
            position.unwrap_or(DEFAULT_POSITION),
            radius,
        );
        self.map.save_landmark(&landmark).await?;
        tracing::info!(
            landmark_id = %landmark.id,
            map_id = %map_id,
            rest_point = landmark.is_rest_point(),
            radius,
            "Landmark added"
        );
        Ok(landmark)
    }
}

// =============================================================================
// Audit trail
// =============================================================================

/// A player's activity, newest first. Visible to the player and to staff.
pub struct ListActivity {
    activity: Arc<dyn ActivityLogRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl ListActivity {
    pub fn new(activity: Arc<dyn ActivityLogRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { activity, profiles }
    }

    pub async fn execute(
        &self,
        actor_id: ProfileId,
        player_id: ProfileId,
        limit: Option<u32>,
    ) -> Result<Vec<ActivityLog>, UseCaseError> {
        require_self_or_staff(self.profiles.as_ref(), actor_id, player_id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        Ok(self.activity.list_for_player(player_id, limit).await?)
    }
}
