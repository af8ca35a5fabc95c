//! Notification outbox. Delivery (websocket, chat bot) reads from this table.

use async_trait::async_trait;
use covenant_domain::{Notification, ProfileId};

use super::{from_rows, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{NotificationPort, NotifyError, RepoError};

impl SqliteStore {
    /// Notifications addressed to `target`, newest first.
    pub async fn list_notifications(
        &self,
        target: ProfileId,
    ) -> Result<Vec<Notification>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM notifications WHERE target_id = ? ORDER BY created_at DESC",
        )
        .bind(target.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(super::db("notifications.list"))?;
        from_rows(bodies)
    }
}

#[async_trait]
impl NotificationPort for SqliteStore {
    async fn dispatch(&self, notification: Notification) -> Result<(), NotifyError> {
        let body = to_json(&notification).map_err(|e| NotifyError::DispatchFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, target_id, kind, created_at, body)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(notification.id.to_string())
        .bind(notification.target.to_string())
        .bind(notification.kind.as_str())
        .bind(ts(notification.created_at))
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| NotifyError::DispatchFailed(e.to_string()))?;

        tracing::debug!(
            target_id = %notification.target,
            kind = %notification.kind,
            "Notification queued"
        );
        Ok(())
    }
}
