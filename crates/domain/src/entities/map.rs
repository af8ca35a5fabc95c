//! Map placement entities used by geofence checks.

use serde::{Deserialize, Serialize};

use crate::value_objects::{within_radius, MapPoint};
use crate::{LandmarkId, MapId, ProfileId, ReligionId, TokenId};

/// Who a token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenOwner {
    Player { profile_id: ProfileId },
    Npc { name: String },
}

/// A positioned token on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapToken {
    pub id: TokenId,
    pub map_id: MapId,
    pub owner: TokenOwner,
    pub position: MapPoint,
    /// NPC interaction radius; 0 disables physical gating.
    #[serde(default)]
    pub interaction_radius: f64,
}

impl MapToken {
    pub fn player(profile_id: ProfileId, map_id: MapId, position: MapPoint) -> Self {
        Self {
            id: TokenId::new(),
            map_id,
            owner: TokenOwner::Player { profile_id },
            position,
            interaction_radius: 0.0,
        }
    }

    pub fn npc(name: impl Into<String>, map_id: MapId, position: MapPoint, radius: f64) -> Self {
        Self {
            id: TokenId::new(),
            map_id,
            owner: TokenOwner::Npc { name: name.into() },
            position,
            interaction_radius: radius.max(0.0),
        }
    }

    pub fn player_id(&self) -> Option<ProfileId> {
        match &self.owner {
            TokenOwner::Player { profile_id } => Some(*profile_id),
            TokenOwner::Npc { .. } => None,
        }
    }

    /// Whether this NPC gates interaction by distance.
    pub fn gates_proximity(&self) -> bool {
        self.interaction_radius > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LandmarkKind {
    RestPoint,
    Church { religion_id: ReligionId },
}

/// A circular zone on a map (rest point, church).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub id: LandmarkId,
    pub map_id: MapId,
    pub name: String,
    pub kind: LandmarkKind,
    pub position: MapPoint,
    pub radius: f64,
}

impl Landmark {
    pub fn new(
        name: impl Into<String>,
        map_id: MapId,
        kind: LandmarkKind,
        position: MapPoint,
        radius: f64,
    ) -> Self {
        Self {
            id: LandmarkId::new(),
            map_id,
            name: name.into(),
            kind,
            position,
            radius: radius.max(0.0),
        }
    }

    pub fn contains(&self, point: MapPoint) -> bool {
        within_radius(point, self.position, self.radius)
    }

    pub fn is_rest_point(&self) -> bool {
        matches!(self.kind, LandmarkKind::RestPoint)
    }

    pub fn is_church_of(&self, religion: ReligionId) -> bool {
        matches!(self.kind, LandmarkKind::Church { religion_id } if religion_id == religion)
    }
}
