//! Rule refusals a player or reviewer can understand and act on.

use thiserror::Error;

/// A domain rule refused the requested operation.
///
/// Every variant renders to a short message that names the constraint that failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyViolation {
    #[error("code expired")]
    CodeExpired,

    #[error("repeat limit reached ({used}/{max})")]
    RepeatLimitReached { used: u32, max: u32 },

    #[error("not in required location")]
    NotInRequiredLocation,

    #[error("not in required radius (distance {distance:.1}, radius {radius:.1})")]
    NotInRequiredRadius { distance: f64, radius: f64 },

    #[error("already submitted today")]
    AlreadySubmittedToday,

    #[error("insufficient spirit ({have}/{need})")]
    InsufficientSpirit { have: i32, need: i32 },

    #[error("cooldown active ({remaining_minutes} min remaining)")]
    CooldownActive { remaining_minutes: i64 },

    #[error("requires sequence {required} or lower")]
    SequenceTooLow { required: u8 },

    #[error("skill belongs to another pathway")]
    PathwayMismatch,

    #[error("granted skill already used")]
    GrantAlreadyUsed,

    #[error("granted skill expired")]
    GrantExpired,

    #[error("granted skill is no longer active")]
    GrantInactive,

    #[error("granted skill is not transferable")]
    GrantNotTransferable,

    #[error("mercy requested before all tasks were completed")]
    MercyBeforeCompletion,

    #[error("punishment deadline has passed")]
    DeadlinePassed,

    #[error("staff only")]
    StaffOnly,

    #[error("not near a rest point")]
    NotNearRestPoint,

    #[error("not near a church of your religion")]
    NotNearChurch,

    #[error("no religion")]
    NoReligion,

    #[error("sanity already full")]
    SanityFull,

    #[error("potion digest incomplete ({progress}/100)")]
    DigestIncomplete { progress: i32 },

    #[error("no pathway")]
    NoPathway,

    #[error("already at the highest sequence")]
    SequenceCeiling,

    #[error("already submitted roleplay today")]
    RoleplayAlreadySubmittedToday,
}
