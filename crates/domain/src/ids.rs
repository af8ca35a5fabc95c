use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Players and staff
define_id!(ProfileId);
define_id!(PathwayId);
define_id!(ReligionId);

// Map placement
define_id!(MapId);
define_id!(TokenId);
define_id!(LandmarkId);

// Templates and submissions
define_id!(CodeId);
define_id!(SubmissionId);

// Skills
define_id!(SkillId);
define_id!(GrantedSkillId);

// Punishments
define_id!(PunishmentId);

// Roleplay review
define_id!(RoleplaySubmissionId);
define_id!(RoleplayLinkId);

// Audit trail
define_id!(ActivityLogId);
define_id!(NotificationId);
