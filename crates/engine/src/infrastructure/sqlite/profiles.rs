use async_trait::async_trait;
use chrono::Utc;
use covenant_domain::{Profile, ProfileId};
use sqlx::{Executor, Sqlite};

use super::{count, db, from_json, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{ProfileRepo, RepoError};

/// Upserts a profile on any executor, so transactional commits can reuse it.
pub(super) async fn upsert_profile<'e, E>(executor: E, profile: &Profile) -> Result<(), RepoError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let body = to_json(profile)?;
    sqlx::query(
        r#"
        INSERT INTO profiles (id, body, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(profile.id().to_string())
    .bind(body)
    .bind(ts(Utc::now()))
    .execute(executor)
    .await
    .map_err(db("profiles.save"))?;
    Ok(())
}

#[async_trait]
impl ProfileRepo for SqliteStore {
    async fn get(&self, id: ProfileId) -> Result<Option<Profile>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("profiles.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn save(&self, profile: &Profile) -> Result<(), RepoError> {
        upsert_profile(&self.pool, profile).await
    }

    async fn count(&self) -> Result<u32, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(db("profiles.count"))?;
        Ok(count(total))
    }
}

#[cfg(test)]
mod tests {
    use covenant_domain::{ResourceDelta, Role, Vitals};

    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_store;

    #[tokio::test]
    async fn save_then_get_keeps_vitals() {
        let (store, _dir) = temp_store().await;
        let mut profile = Profile::new("Klein", Role::Player, Utc::now())
            .with_vitals(Vitals::new(12, (4, 10), (3, 5), (6, 8)));
        ProfileRepo::save(&store, &profile).await.unwrap();

        profile.apply_delta(&ResourceDelta::ZERO.with_sanity(2));
        ProfileRepo::save(&store, &profile).await.unwrap();

        let loaded = ProfileRepo::get(&store, profile.id()).await.unwrap().unwrap();
        assert_eq!(loaded.vitals().sanity(), 6);
        assert_eq!(loaded.vitals().max_spirit(), 8);
        assert_eq!(loaded.display_name(), "Klein");
    }

    #[tokio::test]
    async fn count_tracks_saved_profiles() {
        let (store, _dir) = temp_store().await;
        assert_eq!(ProfileRepo::count(&store).await.unwrap(), 0);
        let profile = Profile::new("Klein", Role::Owner, Utc::now());
        ProfileRepo::save(&store, &profile).await.unwrap();
        ProfileRepo::save(&store, &profile).await.unwrap();
        assert_eq!(ProfileRepo::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_profile_is_none() {
        let (store, _dir) = temp_store().await;
        assert!(ProfileRepo::get(&store, ProfileId::new())
            .await
            .unwrap()
            .is_none());
    }
}
