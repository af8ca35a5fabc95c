use async_trait::async_trait;
use chrono::NaiveDate;
use covenant_domain::{Profile, ProfileId, RoleplayLink, RoleplayLinkId, RoleplaySubmission};

use super::profiles::upsert_profile;
use super::{db, from_json, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{RepoError, RoleplayRepo, TransitionOutcome};

#[async_trait]
impl RoleplayRepo for SqliteStore {
    async fn insert(&self, submission: &RoleplaySubmission) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(db("roleplay.insert"))?;

        sqlx::query(
            r#"
            INSERT INTO roleplay_submissions (id, player_id, submitted_on, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(submission.id().to_string())
        .bind(submission.player_id().to_string())
        .bind(submission.submitted_on().to_string())
        .bind(ts(submission.created_at()))
        .execute(&mut *tx)
        .await
        .map_err(db("roleplay.insert"))?;

        for link in submission.links() {
            sqlx::query(
                r#"
                INSERT INTO roleplay_links (id, submission_id, player_id, reviewed, body)
                VALUES (?, ?, ?, 0, ?)
                "#,
            )
            .bind(link.id().to_string())
            .bind(link.submission_id().to_string())
            .bind(link.player_id().to_string())
            .bind(to_json(link)?)
            .execute(&mut *tx)
            .await
            .map_err(db("roleplay.insert_link"))?;
        }

        tx.commit().await.map_err(db("roleplay.insert"))?;
        Ok(())
    }

    async fn exists_for_day(&self, player: ProfileId, day: NaiveDate) -> Result<bool, RepoError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM roleplay_submissions WHERE player_id = ? AND submitted_on = ? LIMIT 1",
        )
        .bind(player.to_string())
        .bind(day.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("roleplay.exists_for_day"))?;
        Ok(found.is_some())
    }

    async fn get_link(&self, id: RoleplayLinkId) -> Result<Option<RoleplayLink>, RepoError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM roleplay_links WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db("roleplay.get_link"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn review_link_with_profile(
        &self,
        link: &RoleplayLink,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db("roleplay.review"))?;

        let result = sqlx::query(
            "UPDATE roleplay_links SET reviewed = 1, body = ? WHERE id = ? AND reviewed = 0",
        )
        .bind(to_json(link)?)
        .bind(link.id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(db("roleplay.review"))?;

        if result.rows_affected() == 0 {
            return Ok(TransitionOutcome::AlreadyResolved);
        }

        upsert_profile(&mut *tx, profile).await?;
        tx.commit().await.map_err(db("roleplay.review"))?;
        Ok(TransitionOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use covenant_domain::{DigestLevel, Role};

    use super::*;
    use crate::infrastructure::ports::ProfileRepo;
    use crate::infrastructure::sqlite::test_support::temp_store;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[tokio::test]
    async fn one_submission_per_player_and_day() {
        let (store, _dir) = temp_store().await;
        let player = ProfileId::new();
        let first = RoleplaySubmission::new(player, ["https://rp/1"], day(), Utc::now()).unwrap();
        store.insert(&first).await.unwrap();
        assert!(store.exists_for_day(player, day()).await.unwrap());
        assert!(!store
            .exists_for_day(player, day().succ_opt().unwrap())
            .await
            .unwrap());

        let again = RoleplaySubmission::new(player, ["https://rp/2"], day(), Utc::now()).unwrap();
        let err = store.insert(&again).await.unwrap_err();
        assert!(err.is_constraint());
        // The rolled-back links are gone too.
        assert!(store
            .get_link(again.links()[0].id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn second_review_loses_and_keeps_profile() {
        let (store, _dir) = temp_store().await;
        let mut profile = Profile::new("Audrey", Role::Player, Utc::now());
        ProfileRepo::save(&store, &profile).await.unwrap();
        let submission =
            RoleplaySubmission::new(profile.id(), ["https://rp/1"], day(), Utc::now()).unwrap();
        store.insert(&submission).await.unwrap();

        let mut link = store
            .get_link(submission.links()[0].id())
            .await
            .unwrap()
            .unwrap();
        link.review_with(DigestLevel::Medium, "solid", ProfileId::new(), Utc::now())
            .unwrap();
        profile.advance_digest(DigestLevel::Medium.percent());
        assert_eq!(
            store.review_link_with_profile(&link, &profile).await.unwrap(),
            TransitionOutcome::Applied
        );

        profile.advance_digest(DigestLevel::Medium.percent());
        assert_eq!(
            store.review_link_with_profile(&link, &profile).await.unwrap(),
            TransitionOutcome::AlreadyResolved
        );

        let stored = ProfileRepo::get(&store, profile.id()).await.unwrap().unwrap();
        assert_eq!(stored.digest_progress(), 10);
        let stored_link = store.get_link(link.id()).await.unwrap().unwrap();
        assert!(stored_link.is_reviewed());
    }
}
