//! Covenant domain - bounded player resources and the rules that move them.
//!
//! ## Structure
//!
//! - `ledger` - the only place resource arithmetic happens
//! - `aggregates/` - Profile, Code, Submission, GrantedSkill, Punishment, Roleplay
//! - `entities/` - Skill definitions, map placement, audit and notification records
//! - `value_objects/` - validated values (deltas, evidence, thresholds, geofence)

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod ledger;
pub mod policy;
pub mod value_objects;

pub use aggregates::{
    Code, CodeKind, CodeRevision, DigestLevel, EventMode, GrantedSkill, GroupMode, LinkReview,
    LocationGate, Profile, Punishment, PunishmentChanges, PunishmentPlayer, PunishmentUpdateError,
    RequiredTask, ReusePolicy, RoleplayLink, RoleplaySubmission, SkillEffects, Submission,
    SubmissionKind, SubmissionStatus, DEFAULT_COOLDOWN_MINUTES, DEFAULT_SEQUENCE,
    MAX_DIGEST_PROGRESS,
};
pub use entities::{
    ActivityEntry, ActivityLog, Landmark, LandmarkKind, MapToken, Notification, NotificationKind,
    Skill, TokenOwner,
};
pub use error::DomainError;
pub use events::LedgerChange;
pub use ids::*;
pub use policy::PolicyViolation;
pub use value_objects::{
    within_radius, CastReference, CastSource, Evidence, GameCalendar, MapPoint, ResourceDelta,
    Role, ShortCode, SuccessThreshold, Vitals, CAST_DIE_FACES, SHORT_CODE_ATTEMPTS,
    SHORT_CODE_LETTERS,
};
