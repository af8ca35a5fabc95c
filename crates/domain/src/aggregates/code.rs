//! Code aggregate - a staff-authored action or quest template.
//!
//! Action rewards are non-negative. Quest rewards may carry negative deltas
//! (a quest can cost sanity), and only quests carry location gates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ResourceDelta, ShortCode};
use crate::{CodeId, DomainError, MapId, ProfileId, TokenId};

/// Which template family a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Action,
    Quest,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Quest => "quest",
        }
    }
}

/// Physical requirements a quest places on the submitting player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGate {
    /// Player's token must be on this map.
    pub map_id: Option<MapId>,
    /// Player must be within this NPC token's interaction radius.
    pub npc_token_id: Option<TokenId>,
}

impl LocationGate {
    pub fn is_empty(&self) -> bool {
        self.map_id.is_none() && self.npc_token_id.is_none()
    }
}

/// A staff edit. Every editable field is replaced; kind and short code stay.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRevision {
    pub name: String,
    /// `None` keeps the current reward.
    pub reward: Option<ResourceDelta>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` lifts the limit.
    pub max_repeats: Option<u32>,
    pub gate: LocationGate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    id: CodeId,
    kind: CodeKind,
    name: String,
    code: ShortCode,
    reward: ResourceDelta,
    expires_at: Option<DateTime<Utc>>,
    max_repeats: Option<u32>,
    #[serde(default)]
    gate: LocationGate,
    #[serde(default)]
    archived: bool,
    created_by: ProfileId,
    created_at: DateTime<Utc>,
}

impl Code {
    /// Creates a template. Fails on a blank name or a negative action reward.
    pub fn new(
        kind: CodeKind,
        name: impl Into<String>,
        code: ShortCode,
        reward: ResourceDelta,
        created_by: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: CodeId::new(),
            kind,
            name: checked_name(name)?,
            code,
            reward: checked_reward(kind, reward)?,
            expires_at: None,
            max_repeats: None,
            gate: LocationGate::default(),
            archived: false,
            created_by,
            created_at: now,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CodeId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn code(&self) -> &ShortCode {
        &self.code
    }

    #[inline]
    pub fn reward(&self) -> &ResourceDelta {
        &self.reward
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[inline]
    pub fn max_repeats(&self) -> Option<u32> {
        self.max_repeats
    }

    #[inline]
    pub fn gate(&self) -> &LocationGate {
        &self.gate
    }

    #[inline]
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    #[inline]
    pub fn created_by(&self) -> ProfileId {
        self.created_by
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True once `expires_at` lies strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================


    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Caps how many non-rejected submissions one player may make.
    pub fn with_max_repeats(mut self, max_repeats: u32) -> Result<Self, DomainError> {
        self.max_repeats = Some(checked_max_repeats(max_repeats)?);
        Ok(self)
    }

    /// Attaches a location gate. Only quests may be gated.
    pub fn with_gate(mut self, gate: LocationGate) -> Result<Self, DomainError> {
        self.gate = self.checked_gate(gate)?;
        Ok(self)
    }

    fn checked_gate(&self, gate: LocationGate) -> Result<LocationGate, DomainError> {
        if self.kind == CodeKind::Action && !gate.is_empty() {
            return Err(DomainError::validation(
                "Only quest codes can require a location",
            ));
        }
        Ok(gate)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Applies a staff edit. Nothing changes unless every field validates.
    pub fn revise(&mut self, revision: CodeRevision) -> Result<(), DomainError> {
        let name = checked_name(revision.name)?;
        let reward = match revision.reward {
            Some(reward) => checked_reward(self.kind, reward)?,
            None => self.reward,
        };
        let max_repeats = revision.max_repeats.map(checked_max_repeats).transpose()?;
        let gate = self.checked_gate(revision.gate)?;

        self.name = name;
        self.reward = reward;
        self.expires_at = revision.expires_at;
        self.max_repeats = max_repeats;
        self.gate = gate;
        Ok(())
    }

    /// Soft-deletes the code. Returns false if it was already archived.
    pub fn archive(&mut self) -> bool {
        let changed = !self.archived;
        self.archived = true;
        changed
    }
}

fn checked_name(name: impl Into<String>) -> Result<String, DomainError> {
    let name = name.into().trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("Code name cannot be empty"));
    }
    Ok(name)
}

fn checked_reward(kind: CodeKind, reward: ResourceDelta) -> Result<ResourceDelta, DomainError> {
    match kind {
        CodeKind::Action => reward.ensure_non_negative("Action reward"),
        CodeKind::Quest => Ok(reward),
    }
}

fn checked_max_repeats(max_repeats: u32) -> Result<u32, DomainError> {
    if max_repeats == 0 {
        return Err(DomainError::validation(
            "Max repeats must be at least 1; omit it for unlimited",
        ));
    }
    Ok(max_repeats)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn short() -> ShortCode {
        ShortCode::new("01-02-25-abcd").unwrap()
    }

    mod constructor {
        use super::*;

        #[test]
        fn action_rejects_negative_reward() {
            let err = Code::new(
                CodeKind::Action,
                "Patrol",
                short(),
                ResourceDelta::ZERO.with_sanity(-1),
                ProfileId::new(),
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }

        #[test]
        fn quest_allows_negative_reward() {
            let code = Code::new(
                CodeKind::Quest,
                "Into the fog",
                short(),
                ResourceDelta::ZERO.with_sanity(-3),
                ProfileId::new(),
                Utc::now(),
            )
            .unwrap();
            assert_eq!(code.reward().sanity, -3);
        }

        #[test]
        fn blank_name_is_rejected() {
            assert!(Code::new(
                CodeKind::Quest,
                "   ",
                short(),
                ResourceDelta::ZERO,
                ProfileId::new(),
                Utc::now()
            )
            .is_err());
        }
    }

    mod rules {
        use super::*;

        fn quest() -> Code {
            Code::new(
                CodeKind::Quest,
                "Errand",
                short(),
                ResourceDelta::ZERO,
                ProfileId::new(),
                Utc::now(),
            )
            .unwrap()
        }

        #[test]
        fn expiry_is_strictly_before_now() {
            let now = Utc::now();
            let code = quest().with_expiry(now);
            assert!(!code.is_expired(now));
            assert!(code.is_expired(now + Duration::seconds(1)));
        }

        #[test]
        fn zero_max_repeats_is_rejected() {
            assert!(matches!(
                quest().with_max_repeats(0),
                Err(DomainError::Validation(_))
            ));
            assert_eq!(quest().with_max_repeats(2).unwrap().max_repeats(), Some(2));
            assert_eq!(quest().max_repeats(), None);
        }

        #[test]
        fn actions_cannot_be_gated() {
            let action = Code::new(
                CodeKind::Action,
                "Patrol",
                short(),
                ResourceDelta::ZERO,
                ProfileId::new(),
                Utc::now(),
            )
            .unwrap();
            let gate = LocationGate {
                map_id: Some(MapId::new()),
                npc_token_id: None,
            };
            assert!(action.with_gate(gate).is_err());
            assert!(quest().with_gate(gate).is_ok());
        }

        fn revision(name: &str) -> CodeRevision {
            CodeRevision {
                name: name.into(),
                reward: None,
                expires_at: None,
                max_repeats: None,
                gate: LocationGate::default(),
            }
        }

        #[test]
        fn revise_replaces_fields_and_lifts_limits() {
            let now = Utc::now();
            let mut code = quest().with_max_repeats(3).unwrap().with_expiry(now);
            code.revise(CodeRevision {
                reward: Some(ResourceDelta::ZERO.with_sanity(-2)),
                ..revision("  Deeper errand ")
            })
            .unwrap();
            assert_eq!(code.name(), "Deeper errand");
            assert_eq!(code.reward().sanity, -2);
            assert_eq!(code.max_repeats(), None);
            assert_eq!(code.expires_at(), None);
        }

        #[test]
        fn rejected_revision_leaves_code_untouched() {
            let mut action = Code::new(
                CodeKind::Action,
                "Patrol",
                short(),
                ResourceDelta::ZERO.with_travel(1),
                ProfileId::new(),
                Utc::now(),
            )
            .unwrap();
            let before = action.clone();

            let negative = CodeRevision {
                reward: Some(ResourceDelta::ZERO.with_hp(-1)),
                ..revision("Night patrol")
            };
            assert!(action.revise(negative).is_err());
            let zero = CodeRevision {
                max_repeats: Some(0),
                ..revision("Night patrol")
            };
            assert!(action.revise(zero).is_err());
            assert_eq!(action, before);
        }

        #[test]
        fn archive_is_idempotent() {
            let mut code = quest();
            assert!(code.archive());
            assert!(!code.archive());
            assert!(code.is_archived());
        }
    }
}
