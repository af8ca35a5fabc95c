//! Resource value objects - the bounded vitals a profile carries and the
//! seven-field delta bundle shared by codes, granted skills and punishments.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A bundle of resource changes.
///
/// Current-value fields are deltas; `max_*` fields grow (or shrink) the matching
/// maximum. Applied only through [`crate::ledger::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDelta {
    pub hp: i32,
    pub sanity: i32,
    pub travel: i32,
    pub spirit: i32,
    pub max_sanity: i32,
    pub max_travel: i32,
    pub max_spirit: i32,
}

impl ResourceDelta {
    pub const ZERO: Self = Self {
        hp: 0,
        sanity: 0,
        travel: 0,
        spirit: 0,
        max_sanity: 0,
        max_travel: 0,
        max_spirit: 0,
    };

    /// Delta that only debits spirit by `cost`.
    pub fn spirit_cost(cost: i32) -> Self {
        Self {
            spirit: cost.saturating_neg(),
            ..Self::ZERO
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn with_sanity(mut self, sanity: i32) -> Self {
        self.sanity = sanity;
        self
    }

    pub fn with_travel(mut self, travel: i32) -> Self {
        self.travel = travel;
        self
    }

    pub fn with_spirit(mut self, spirit: i32) -> Self {
        self.spirit = spirit;
        self
    }

    pub fn with_max_sanity(mut self, max_sanity: i32) -> Self {
        self.max_sanity = max_sanity;
        self
    }

    pub fn with_max_travel(mut self, max_travel: i32) -> Self {
        self.max_travel = max_travel;
        self
    }

    pub fn with_max_spirit(mut self, max_spirit: i32) -> Self {
        self.max_spirit = max_spirit;
        self
    }

    fn fields(&self) -> [i32; 7] {
        [
            self.hp,
            self.sanity,
            self.travel,
            self.spirit,
            self.max_sanity,
            self.max_travel,
            self.max_spirit,
        ]
    }

    pub fn is_zero(&self) -> bool {
        self.fields().iter().all(|v| *v == 0)
    }

    pub fn has_negative(&self) -> bool {
        self.fields().iter().any(|v| *v < 0)
    }

    /// Every field negated; used to turn stored penalty magnitudes into reductions.
    pub fn negated(&self) -> Self {
        Self {
            hp: self.hp.saturating_neg(),
            sanity: self.sanity.saturating_neg(),
            travel: self.travel.saturating_neg(),
            spirit: self.spirit.saturating_neg(),
            max_sanity: self.max_sanity.saturating_neg(),
            max_travel: self.max_travel.saturating_neg(),
            max_spirit: self.max_spirit.saturating_neg(),
        }
    }

    /// Rejects bundles with negative fields. `what` names the bundle in the message.
    pub fn ensure_non_negative(self, what: &str) -> Result<Self, DomainError> {
        if self.has_negative() {
            return Err(DomainError::validation(format!(
                "{what} cannot contain negative values"
            )));
        }
        Ok(self)
    }
}

/// The five current/maximum resource pairs of a profile.
///
/// # Invariants
///
/// - `0 <= current <= max` for sanity, travel and spirit
/// - every max is at least 1
/// - `hp >= 0`, no ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    hp: i32,
    sanity: i32,
    max_sanity: i32,
    travel: i32,
    max_travel: i32,
    spirit: i32,
    max_spirit: i32,
}

impl Vitals {
    /// Builds vitals, clamping every value into its invariant range.
    pub fn new(
        hp: i32,
        (sanity, max_sanity): (i32, i32),
        (travel, max_travel): (i32, i32),
        (spirit, max_spirit): (i32, i32),
    ) -> Self {
        let max_sanity = max_sanity.max(1);
        let max_travel = max_travel.max(1);
        let max_spirit = max_spirit.max(1);
        Self {
            hp: hp.max(0),
            sanity: sanity.clamp(0, max_sanity),
            max_sanity,
            travel: travel.clamp(0, max_travel),
            max_travel,
            spirit: spirit.clamp(0, max_spirit),
            max_spirit,
        }
    }

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[inline]
    pub fn sanity(&self) -> i32 {
        self.sanity
    }

    #[inline]
    pub fn max_sanity(&self) -> i32 {
        self.max_sanity
    }

    #[inline]
    pub fn travel(&self) -> i32 {
        self.travel
    }

    #[inline]
    pub fn max_travel(&self) -> i32 {
        self.max_travel
    }

    #[inline]
    pub fn spirit(&self) -> i32 {
        self.spirit
    }

    #[inline]
    pub fn max_spirit(&self) -> i32 {
        self.max_spirit
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(10, (10, 10), (10, 10), (10, 10))
    }
}
