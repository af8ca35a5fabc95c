use async_trait::async_trait;
use covenant_domain::{Landmark, MapId, MapToken, ProfileId, TokenId};

use super::{db, from_json, from_rows, to_json, SqliteStore};
use crate::infrastructure::ports::{MapRepo, RepoError};

#[async_trait]
impl MapRepo for SqliteStore {
    async fn get_player_token(&self, player: ProfileId) -> Result<Option<MapToken>, RepoError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM map_tokens WHERE player_id = ? LIMIT 1")
                .bind(player.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db("map_tokens.get_player_token"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn get_token(&self, id: TokenId) -> Result<Option<MapToken>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM map_tokens WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("map_tokens.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn list_landmarks(&self, map: MapId) -> Result<Vec<Landmark>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar("SELECT body FROM landmarks WHERE map_id = ?")
            .bind(map.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db("landmarks.list"))?;
        from_rows(bodies)
    }

    async fn save_token(&self, token: &MapToken) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO map_tokens (id, map_id, player_id, body)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                map_id = excluded.map_id,
                player_id = excluded.player_id,
                body = excluded.body
            "#,
        )
        .bind(token.id.to_string())
        .bind(token.map_id.to_string())
        .bind(token.player_id().map(|id| id.to_string()))
        .bind(to_json(token)?)
        .execute(&self.pool)
        .await
        .map_err(db("map_tokens.save"))?;
        Ok(())
    }

    async fn save_landmark(&self, landmark: &Landmark) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO landmarks (id, map_id, body)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                map_id = excluded.map_id,
                body = excluded.body
            "#,
        )
        .bind(landmark.id.to_string())
        .bind(landmark.map_id.to_string())
        .bind(to_json(landmark)?)
        .execute(&self.pool)
        .await
        .map_err(db("landmarks.save"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use covenant_domain::{LandmarkKind, MapPoint};

    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_store;

    #[tokio::test]
    async fn player_token_and_landmarks_are_scoped_by_map() {
        let (store, _dir) = temp_store().await;
        let (docks, cathedral) = (MapId::new(), MapId::new());
        let player = ProfileId::new();

        let token = MapToken::player(player, docks, MapPoint::new(50.0, 50.0));
        store.save_token(&token).await.unwrap();
        store
            .save_token(&MapToken::npc("Old Neil", docks, MapPoint::new(10.0, 10.0), 4.0))
            .await
            .unwrap();
        store
            .save_landmark(&Landmark::new(
                "Inn",
                docks,
                LandmarkKind::RestPoint,
                MapPoint::new(53.0, 54.0),
                5.0,
            ))
            .await
            .unwrap();
        store
            .save_landmark(&Landmark::new(
                "Bench",
                cathedral,
                LandmarkKind::RestPoint,
                MapPoint::new(0.0, 0.0),
                5.0,
            ))
            .await
            .unwrap();

        let found = store.get_player_token(player).await.unwrap().unwrap();
        assert_eq!(found.id, token.id);
        assert_eq!(store.list_landmarks(docks).await.unwrap().len(), 1);
    }
}
