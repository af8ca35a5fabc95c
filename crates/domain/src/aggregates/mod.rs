//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate:
//! - Has a unique identity
//! - Keeps its fields private and exposes behavior through methods
//! - Validates lifecycle transitions in memory; the store makes them conditional
//!
//! Resource arithmetic never happens here directly: profiles delegate to
//! [`crate::ledger`] and return [`crate::events::LedgerChange`].

pub mod code;
pub mod granted_skill;
pub mod profile;
pub mod punishment;
pub mod roleplay;
pub mod submission;

pub use code::{Code, CodeKind, CodeRevision, LocationGate};
pub use granted_skill::{GrantedSkill, ReusePolicy, SkillEffects, DEFAULT_COOLDOWN_MINUTES};
pub use profile::{Profile, DEFAULT_SEQUENCE, MAX_DIGEST_PROGRESS};
pub use punishment::{
    EventMode, GroupMode, Punishment, PunishmentChanges, PunishmentPlayer, PunishmentUpdateError,
    RequiredTask,
};
pub use roleplay::{DigestLevel, LinkReview, RoleplayLink, RoleplaySubmission};
pub use submission::{Submission, SubmissionKind, SubmissionStatus};
