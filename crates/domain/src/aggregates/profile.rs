//! Profile aggregate - a player's or staff member's standing in the session
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: resources change only through ledger-backed methods
//! - **Valid by construction**: `Vitals` clamps on every construction
//! - **Builder pattern**: fluent `with_*` methods for optional data
//! - **Events**: mutations return a [`LedgerChange`] describing before/after

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::events::LedgerChange;
use crate::ledger;
use crate::policy::PolicyViolation;
use crate::value_objects::{ResourceDelta, Role, Vitals};
use crate::{DomainError, PathwayId, ProfileId, ReligionId};

/// Starting pathway rank; 0 is the most advanced.
pub const DEFAULT_SEQUENCE: u8 = 9;

/// Upper bound for potion-digest progress.
pub const MAX_DIGEST_PROGRESS: i32 = 100;

/// A participant in the session.
///
/// # Invariants
///
/// - vitals satisfy `0 <= current <= max` and `max >= 1` for capped resources
/// - `sequence <= 9`
/// - `digest_progress` is within `0..=100`
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    // Identity
    id: ProfileId,
    display_name: String,
    role: Role,

    // Resources
    vitals: Vitals,

    // Progression
    pathway_id: Option<PathwayId>,
    sequence: u8,
    religion_id: Option<ReligionId>,
    digest_progress: i32,

    created_at: DateTime<Utc>,
}

impl Profile {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(display_name: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: ProfileId::new(),
            display_name: display_name.into(),
            role,
            vitals: Vitals::default(),
            pathway_id: None,
            sequence: DEFAULT_SEQUENCE,
            religion_id: None,
            digest_progress: 0,
            created_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    #[inline]
    pub fn vitals(&self) -> Vitals {
        self.vitals
    }

    #[inline]
    pub fn pathway_id(&self) -> Option<PathwayId> {
        self.pathway_id
    }

    /// Pathway rank (9 = starting rank, 0 = ceiling).
    #[inline]
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    #[inline]
    pub fn religion_id(&self) -> Option<ReligionId> {
        self.religion_id
    }

    #[inline]
    pub fn digest_progress(&self) -> i32 {
        self.digest_progress
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================


    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = vitals;
        self
    }

    pub fn with_pathway(mut self, pathway_id: PathwayId, sequence: u8) -> Self {
        self.pathway_id = Some(pathway_id);
        self.sequence = sequence.min(DEFAULT_SEQUENCE);
        self
    }

    pub fn with_religion(mut self, religion_id: ReligionId) -> Self {
        self.religion_id = Some(religion_id);
        self
    }

    pub fn with_digest_progress(mut self, progress: i32) -> Self {
        self.digest_progress = progress.clamp(0, MAX_DIGEST_PROGRESS);
        self
    }

    // =========================================================================
    // Ledger Mutations
    // =========================================================================

    /// Applies a resource bundle through the ledger.
    pub fn apply_delta(&mut self, delta: &ResourceDelta) -> LedgerChange {
        let before = self.vitals;
        self.vitals = ledger::apply(before, delta);
        LedgerChange {
            before,
            after: self.vitals,
        }
    }

    /// Refills spirit to its maximum (sleep approval).
    pub fn restore_spirit(&mut self) -> LedgerChange {
        let before = self.vitals;
        self.vitals = ledger::restore_spirit(before);
        LedgerChange {
            before,
            after: self.vitals,
        }
    }

    /// Replaces stored vitals wholesale (staff edits). `Vitals::new` clamps.
    pub fn set_vitals(&mut self, vitals: Vitals) -> LedgerChange {
        let before = self.vitals;
        self.vitals = vitals;
        LedgerChange {
            before,
            after: self.vitals,
        }
    }

    /// Moves potion-digest progress, clamped to `0..=100`. Returns the new value.
    pub fn advance_digest(&mut self, amount: i32) -> i32 {
        self.digest_progress = self
            .digest_progress
            .saturating_add(amount)
            .clamp(0, MAX_DIGEST_PROGRESS);
        self.digest_progress
    }
}

impl Profile {
    // =========================================================================
    // Staff edits and progression
    // =========================================================================

    pub fn rename(&mut self, display_name: &str) -> Result<(), DomainError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Display name cannot be empty"));
        }
        self.display_name = name.to_string();
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_pathway(&mut self, pathway_id: PathwayId, sequence: u8) {
        self.pathway_id = Some(pathway_id);
        self.sequence = sequence.min(DEFAULT_SEQUENCE);
    }

    pub fn set_religion(&mut self, religion_id: Option<ReligionId>) {
        self.religion_id = religion_id;
    }

    /// Spends a full potion digest to move one sequence closer to 0.
    /// Returns the new sequence.
    pub fn promote_sequence(&mut self) -> Result<u8, PolicyViolation> {
        if self.digest_progress < MAX_DIGEST_PROGRESS {
            return Err(PolicyViolation::DigestIncomplete {
                progress: self.digest_progress,
            });
        }
        if self.pathway_id.is_none() {
            return Err(PolicyViolation::NoPathway);
        }
        if self.sequence == 0 {
            return Err(PolicyViolation::SequenceCeiling);
        }
        self.sequence -= 1;
        self.digest_progress = 0;
        Ok(self.sequence)
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileWireFormat {
    id: ProfileId,
    display_name: String,
    #[serde(default)]
    role: Role,
    vitals: Vitals,
    pathway_id: Option<PathwayId>,
    #[serde(default = "default_sequence")]
    sequence: u8,
    religion_id: Option<ReligionId>,
    #[serde(default)]
    digest_progress: i32,
    created_at: DateTime<Utc>,
}

fn default_sequence() -> u8 {
    DEFAULT_SEQUENCE
}

impl Serialize for Profile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ProfileWireFormat {
            id: self.id,
            display_name: self.display_name.clone(),
            role: self.role,
            vitals: self.vitals,
            pathway_id: self.pathway_id,
            sequence: self.sequence,
            religion_id: self.religion_id,
            digest_progress: self.digest_progress,
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ProfileWireFormat::deserialize(deserializer)?;
        let v = wire.vitals;

        Ok(Profile {
            id: wire.id,
            display_name: wire.display_name,
            role: wire.role,
            // Re-clamp stored values in case the row was edited by hand
            vitals: Vitals::new(
                v.hp(),
                (v.sanity(), v.max_sanity()),
                (v.travel(), v.max_travel()),
                (v.spirit(), v.max_spirit()),
            ),
            pathway_id: wire.pathway_id,
            sequence: wire.sequence.min(DEFAULT_SEQUENCE),
            religion_id: wire.religion_id,
            digest_progress: wire.digest_progress.clamp(0, MAX_DIGEST_PROGRESS),
            created_at: wire.created_at,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
