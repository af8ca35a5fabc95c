use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covenant_domain::{Profile, ProfileId, Punishment, PunishmentId, PunishmentPlayer};
use sqlx::{Executor, Sqlite};

use super::profiles::upsert_profile;
use super::{db, from_json, from_rows, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{PunishmentRepo, RepoError, TransitionOutcome};

async fn upsert_punishment<'e, E>(executor: E, punishment: &Punishment) -> Result<(), RepoError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO punishments (id, is_active, archived, deadline, created_at, body)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            is_active = excluded.is_active,
            archived = excluded.archived,
            deadline = excluded.deadline,
            body = excluded.body
        "#,
    )
    .bind(punishment.id().to_string())
    .bind(punishment.is_active())
    .bind(punishment.is_archived())
    .bind(punishment.deadline().map(ts))
    .bind(ts(punishment.created_at()))
    .bind(to_json(punishment)?)
    .execute(executor)
    .await
    .map_err(db("punishments.save"))?;
    Ok(())
}

impl SqliteStore {
    async fn settle_inner(
        &self,
        row: &PunishmentPlayer,
        profile: Option<&Profile>,
    ) -> Result<TransitionOutcome, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db("punishment_players.settle"))?;

        let result = sqlx::query(
            r#"
            UPDATE punishment_players SET settled = ?, body = ?
            WHERE punishment_id = ? AND player_id = ? AND settled = 0
            "#,
        )
        .bind(row.is_settled())
        .bind(to_json(row)?)
        .bind(row.punishment_id().to_string())
        .bind(row.player_id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(db("punishment_players.settle"))?;

        if result.rows_affected() == 0 {
            return Ok(TransitionOutcome::AlreadyResolved);
        }

        if let Some(profile) = profile {
            upsert_profile(&mut *tx, profile).await?;
        }

        tx.commit().await.map_err(db("punishment_players.settle"))?;
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl PunishmentRepo for SqliteStore {
    async fn insert(
        &self,
        punishment: &Punishment,
        players: &[PunishmentPlayer],
    ) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(db("punishments.insert"))?;

        upsert_punishment(&mut *tx, punishment).await?;
        for row in players {
            sqlx::query(
                r#"
                INSERT INTO punishment_players (punishment_id, player_id, settled, body)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(row.punishment_id().to_string())
            .bind(row.player_id().to_string())
            .bind(row.is_settled())
            .bind(to_json(row)?)
            .execute(&mut *tx)
            .await
            .map_err(db("punishments.insert"))?;
        }

        tx.commit().await.map_err(db("punishments.insert"))?;
        Ok(())
    }

    async fn get(&self, id: PunishmentId) -> Result<Option<Punishment>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM punishments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("punishments.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn save(&self, punishment: &Punishment) -> Result<(), RepoError> {
        upsert_punishment(&self.pool, punishment).await
    }

    async fn list_players(&self, id: PunishmentId) -> Result<Vec<PunishmentPlayer>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM punishment_players WHERE punishment_id = ? ORDER BY player_id",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db("punishment_players.list"))?;
        from_rows(bodies)
    }

    async fn get_player(
        &self,
        id: PunishmentId,
        player: ProfileId,
    ) -> Result<Option<PunishmentPlayer>, RepoError> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM punishment_players WHERE punishment_id = ? AND player_id = ?",
        )
        .bind(id.to_string())
        .bind(player.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("punishment_players.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Punishment>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM punishments
            WHERE is_active = 1 AND archived = 0
              AND deadline IS NOT NULL AND deadline < ?
            ORDER BY deadline ASC
            "#,
        )
        .bind(ts(now))
        .fetch_all(&self.pool)
        .await
        .map_err(db("punishments.list_overdue"))?;
        from_rows(bodies)
    }

    async fn settle_player(&self, row: &PunishmentPlayer) -> Result<TransitionOutcome, RepoError> {
        self.settle_inner(row, None).await
    }

    async fn settle_player_with_profile(
        &self,
        row: &PunishmentPlayer,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError> {
        self.settle_inner(row, Some(profile)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use covenant_domain::{CodeId, CodeKind, EventMode, RequiredTask, ResourceDelta, Role};

    use super::*;
    use crate::infrastructure::ports::ProfileRepo;
    use crate::infrastructure::sqlite::test_support::temp_store;

    fn punishment(now: DateTime<Utc>) -> Punishment {
        Punishment::new(
            "Night watch",
            vec![RequiredTask {
                kind: CodeKind::Quest,
                code_id: CodeId::new(),
            }],
            ResourceDelta::ZERO.with_sanity(2),
            EventMode::Individual,
            ProfileId::new(),
            now,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn mercy_and_penalty_are_mutually_exclusive() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();
        let p = punishment(now);
        let mut profile = Profile::new("Fors", Role::Player, now);
        ProfileRepo::save(&store, &profile).await.unwrap();
        let row = PunishmentPlayer::new(p.id(), profile.id());
        store.insert(&p, &[row.clone()]).await.unwrap();

        let mut mercy = row.clone();
        mercy.grant_mercy(now).unwrap();
        let mut penalty = row.clone();
        penalty.apply_penalty(now).unwrap();
        profile.apply_delta(&p.penalty_delta());

        assert_eq!(
            store.settle_player(&mercy).await.unwrap(),
            TransitionOutcome::Applied
        );
        assert_eq!(
            store
                .settle_player_with_profile(&penalty, &profile)
                .await
                .unwrap(),
            TransitionOutcome::AlreadyResolved
        );

        let stored = store.get_player(p.id(), profile.id()).await.unwrap().unwrap();
        assert!(stored.mercy_requested());
        assert!(!stored.penalty_applied());
        let unchanged = ProfileRepo::get(&store, profile.id()).await.unwrap().unwrap();
        assert_eq!(unchanged.vitals().sanity(), 10);
    }

    #[tokio::test]
    async fn overdue_lists_only_active_past_deadline() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();

        let overdue = punishment(now).with_deadline(now - Duration::minutes(1));
        let future = punishment(now).with_deadline(now + Duration::hours(1));
        let mut archived = punishment(now).with_deadline(now - Duration::hours(1));
        archived.archive();
        let open_ended = punishment(now);
        for p in [&overdue, &future, &archived, &open_ended] {
            store.insert(p, &[]).await.unwrap();
        }

        let listed = store.list_overdue(now).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), overdue.id());
    }
}
