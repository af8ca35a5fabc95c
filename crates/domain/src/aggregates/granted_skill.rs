//! GrantedSkill aggregate - a player-held instance of a skill with its own
//! reuse policy, expiry and effect bundle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ResourceDelta;
use crate::{DomainError, GrantedSkillId, PolicyViolation, ProfileId, SkillId};

/// Cooldown used when a grant asks for one without saying how long.
pub const DEFAULT_COOLDOWN_MINUTES: u32 = 60;

/// Governs whether a grant may be cast again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ReusePolicy {
    Once,
    Cooldown { minutes: u32 },
    Unlimited,
}

/// What a granted cast does on top of the spirit cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEffects {
    #[serde(flatten)]
    pub delta: ResourceDelta,
    /// Potion-digest progress, in percentage points.
    #[serde(default)]
    pub progress: i32,
}

impl SkillEffects {
    pub fn is_empty(&self) -> bool {
        self.delta.is_zero() && self.progress == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedSkill {
    id: GrantedSkillId,
    player_id: ProfileId,
    skill_id: SkillId,
    granted_by: ProfileId,
    title: String,
    detail: Option<String>,
    reuse_policy: ReusePolicy,
    times_used: u32,
    last_used_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    effects: SkillEffects,
    is_active: bool,
    is_transferable: bool,
    created_at: DateTime<Utc>,
}

impl GrantedSkill {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(
        player_id: ProfileId,
        skill_id: SkillId,
        granted_by: ProfileId,
        title: impl Into<String>,
        reuse_policy: ReusePolicy,
        effects: SkillEffects,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("Granted skill title cannot be empty"));
        }
        let reuse_policy = match reuse_policy {
            ReusePolicy::Cooldown { minutes: 0 } => ReusePolicy::Cooldown {
                minutes: DEFAULT_COOLDOWN_MINUTES,
            },
            other => other,
        };

        Ok(Self {
            id: GrantedSkillId::new(),
            player_id,
            skill_id,
            granted_by,
            title,
            detail: None,
            reuse_policy,
            times_used: 0,
            last_used_at: None,
            expires_at: None,
            effects,
            is_active: true,
            is_transferable: false,
            created_at: now,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> GrantedSkillId {
        self.id
    }

    #[inline]
    pub fn player_id(&self) -> ProfileId {
        self.player_id
    }

    #[inline]
    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    #[inline]
    pub fn granted_by(&self) -> ProfileId {
        self.granted_by
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    #[inline]
    pub fn reuse_policy(&self) -> ReusePolicy {
        self.reuse_policy
    }

    #[inline]
    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    #[inline]
    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[inline]
    pub fn effects(&self) -> &SkillEffects {
        &self.effects
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn is_transferable(&self) -> bool {
        self.is_transferable
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================


    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into().trim().to_string();
        self.detail = (!detail.is_empty()).then_some(detail);
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_transferable(mut self, is_transferable: bool) -> Self {
        self.is_transferable = is_transferable;
        self
    }

    pub fn with_usage(mut self, times_used: u32, last_used_at: Option<DateTime<Utc>>) -> Self {
        self.times_used = times_used;
        self.last_used_at = last_used_at;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    // =========================================================================
    // Availability
    // =========================================================================

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Whole minutes (rounded up) until a cooldown grant may be cast again.
    pub fn cooldown_remaining_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        let ReusePolicy::Cooldown { minutes } = self.reuse_policy else {
            return None;
        };
        let ready_at = self.last_used_at? + Duration::minutes(i64::from(minutes));
        let remaining_ms = (ready_at - now).num_milliseconds();
        (remaining_ms > 0).then(|| (remaining_ms + 59_999) / 60_000)
    }

    /// Explains why an inactive grant refuses to cast; `Ok` while active.
    pub fn check_active(&self, now: DateTime<Utc>) -> Result<(), PolicyViolation> {
        if self.is_active {
            return Ok(());
        }
        if self.is_expired(now) {
            Err(PolicyViolation::GrantExpired)
        } else if self.reuse_policy == ReusePolicy::Once && self.times_used > 0 {
            Err(PolicyViolation::GrantAlreadyUsed)
        } else {
            Err(PolicyViolation::GrantInactive)
        }
    }

    /// Checks expiry and reuse policy. Does not look at `is_active`.
    pub fn check_available(&self, now: DateTime<Utc>) -> Result<(), PolicyViolation> {
        if self.is_expired(now) {
            return Err(PolicyViolation::GrantExpired);
        }
        match self.reuse_policy {
            ReusePolicy::Once if self.times_used > 0 => Err(PolicyViolation::GrantAlreadyUsed),
            ReusePolicy::Cooldown { .. } => match self.cooldown_remaining_minutes(now) {
                Some(remaining_minutes) => {
                    Err(PolicyViolation::CooldownActive { remaining_minutes })
                }
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Bookkeeping after a cast: one more use, stamped now; once-grants go inactive.
    pub fn record_use(&mut self, now: DateTime<Utc>) {
        self.times_used = self.times_used.saturating_add(1);
        self.last_used_at = Some(now);
        if self.reuse_policy == ReusePolicy::Once {
            self.is_active = false;
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Hands the grant to `new_owner` and resets usage counters.
    pub fn transfer_to(&mut self, new_owner: ProfileId) -> Result<(), PolicyViolation> {
        if !self.is_transferable {
            return Err(PolicyViolation::GrantNotTransferable);
        }
        self.player_id = new_owner;
        self.times_used = 0;
        self.last_used_at = None;
        Ok(())
    }
}
