use async_trait::async_trait;
use covenant_domain::{ActivityLog, ProfileId};

use super::{db, from_rows, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{ActivityLogRepo, RepoError};

#[async_trait]
impl ActivityLogRepo for SqliteStore {
    async fn append(&self, entry: &ActivityLog) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, player_id, kind, created_at, body)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.player_id.to_string())
        .bind(entry.entry.kind())
        .bind(ts(entry.created_at))
        .bind(to_json(entry)?)
        .execute(&self.pool)
        .await
        .map_err(db("activity_logs.append"))?;
        Ok(())
    }

    async fn list_for_player(
        &self,
        player: ProfileId,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM activity_logs
            WHERE player_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(player.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db("activity_logs.list_for_player"))?;
        from_rows(bodies)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use covenant_domain::{ActivityEntry, PunishmentId};

    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_store;

    #[tokio::test]
    async fn newest_entries_come_first() {
        let (store, _dir) = temp_store().await;
        let player = ProfileId::new();
        let now = Utc::now();
        let (old, new) = (PunishmentId::new(), PunishmentId::new());

        store
            .append(&ActivityLog::new(
                player,
                None,
                ActivityEntry::PunishmentAssigned { punishment_id: old },
                now - Duration::minutes(5),
            ))
            .await
            .unwrap();
        store
            .append(&ActivityLog::new(
                player,
                Some(player),
                ActivityEntry::MercyRequested { punishment_id: new },
                now,
            ))
            .await
            .unwrap();

        let entries = store.list_for_player(player, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry.kind(), "mercy_requested");
        assert_eq!(store.list_for_player(player, 1).await.unwrap().len(), 1);
    }
}
