//! External service ports.

use async_trait::async_trait;
use covenant_domain::Notification;

use super::error::NotifyError;

/// Hands resolved-transition events to whatever delivers them to players.
///
/// Fire and forget: callers log a failed dispatch and carry on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<(), NotifyError>;
}
