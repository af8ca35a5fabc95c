//! Plain entities - records without lifecycle rules of their own.

pub mod activity_log;
pub mod map;
pub mod notification;
pub mod skill;

pub use activity_log::{ActivityEntry, ActivityLog};
pub use map::{Landmark, LandmarkKind, MapToken, TokenOwner};
pub use notification::{Notification, NotificationKind};
pub use skill::Skill;
