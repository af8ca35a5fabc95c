//! Append-only audit trail of resource-affecting activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregates::DigestLevel;
use crate::value_objects::{CastReference, CastSource, ResourceDelta, Vitals};
use crate::{
    ActivityLogId, GrantedSkillId, LandmarkId, ProfileId, PunishmentId, RoleplayLinkId, SkillId,
};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEntry {
    SkillCast {
        source: CastSource,
        skill_id: SkillId,
        granted_skill_id: Option<GrantedSkillId>,
        reference: CastReference,
        threshold: i32,
        roll: i32,
        success: bool,
        spirit_cost: i32,
    },
    SkillGranted {
        granted_skill_id: GrantedSkillId,
        skill_id: SkillId,
        title: String,
    },
    SkillTransferred {
        granted_skill_id: GrantedSkillId,
        from: ProfileId,
        to: ProfileId,
    },
    PunishmentAssigned {
        punishment_id: PunishmentId,
    },
    MercyRequested {
        punishment_id: PunishmentId,
    },
    PenaltyApplied {
        punishment_id: PunishmentId,
        penalty: ResourceDelta,
        auto: bool,
    },
    Prayer {
        landmark_id: LandmarkId,
        evidence_count: usize,
        sanity_gained: i32,
    },
    RoleplayReviewed {
        link_id: RoleplayLinkId,
        level: DigestLevel,
        digest_after: i32,
    },
    SequencePromoted {
        sequence: u8,
    },
    ProfileEdited {
        before: Vitals,
        after: Vitals,
    },
}

impl ActivityEntry {
    /// Stable name used as the stored `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SkillCast { .. } => "skill_cast",
            Self::SkillGranted { .. } => "skill_granted",
            Self::SkillTransferred { .. } => "skill_transferred",
            Self::PunishmentAssigned { .. } => "punishment_assigned",
            Self::MercyRequested { .. } => "mercy_requested",
            Self::PenaltyApplied { .. } => "penalty_applied",
            Self::Prayer { .. } => "prayer",
            Self::RoleplayReviewed { .. } => "roleplay_reviewed",
            Self::SequencePromoted { .. } => "sequence_promoted",
            Self::ProfileEdited { .. } => "profile_edited",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: ActivityLogId,
    /// The player the activity concerns.
    pub player_id: ProfileId,
    /// Who triggered it; `None` for automatic sweeps.
    pub actor_id: Option<ProfileId>,
    pub entry: ActivityEntry,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        player_id: ProfileId,
        actor_id: Option<ProfileId>,
        entry: ActivityEntry,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityLogId::new(),
            player_id,
            actor_id,
            entry,
            created_at: now,
        }
    }
}
