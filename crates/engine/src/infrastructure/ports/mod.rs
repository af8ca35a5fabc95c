//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (one SQLite adapter today)
//! - Notification delivery
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

pub use error::{NotifyError, RepoError};
pub use external::NotificationPort;
pub use repos::*;
pub use testing::{ClockPort, RandomPort};
pub use types::TransitionOutcome;

#[cfg(test)]
pub use external::MockNotificationPort;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
