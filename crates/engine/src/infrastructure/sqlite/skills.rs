use async_trait::async_trait;
use covenant_domain::{GrantedSkill, GrantedSkillId, Profile, ProfileId, Skill, SkillId};

use super::profiles::upsert_profile;
use super::{db, from_json, to_json, SqliteStore};
use crate::infrastructure::ports::{GrantedSkillRepo, RepoError, SkillRepo, TransitionOutcome};

#[async_trait]
impl SkillRepo for SqliteStore {
    async fn get(&self, id: SkillId) -> Result<Option<Skill>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("skills.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn save(&self, skill: &Skill) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO skills (id, body) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(skill.id.to_string())
        .bind(to_json(skill)?)
        .execute(&self.pool)
        .await
        .map_err(db("skills.save"))?;
        Ok(())
    }
}

#[async_trait]
impl GrantedSkillRepo for SqliteStore {
    async fn get(&self, id: GrantedSkillId) -> Result<Option<GrantedSkill>, RepoError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM granted_skills WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db("granted_skills.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn save(&self, grant: &GrantedSkill) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO granted_skills (id, player_id, times_used, body)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                player_id = excluded.player_id,
                times_used = excluded.times_used,
                body = excluded.body
            "#,
        )
        .bind(grant.id().to_string())
        .bind(grant.player_id().to_string())
        .bind(i64::from(grant.times_used()))
        .bind(to_json(grant)?)
        .execute(&self.pool)
        .await
        .map_err(db("granted_skills.save"))?;
        Ok(())
    }

    async fn commit_use(
        &self,
        grant: &GrantedSkill,
        expected_times_used: u32,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db("granted_skills.commit_use"))?;

        let result = sqlx::query(
            r#"
            UPDATE granted_skills SET times_used = ?, body = ?
            WHERE id = ? AND player_id = ? AND times_used = ?
            "#,
        )
        .bind(i64::from(grant.times_used()))
        .bind(to_json(grant)?)
        .bind(grant.id().to_string())
        .bind(grant.player_id().to_string())
        .bind(i64::from(expected_times_used))
        .execute(&mut *tx)
        .await
        .map_err(db("granted_skills.commit_use"))?;

        if result.rows_affected() == 0 {
            return Ok(TransitionOutcome::AlreadyResolved);
        }

        upsert_profile(&mut *tx, profile).await?;
        tx.commit().await.map_err(db("granted_skills.commit_use"))?;
        Ok(TransitionOutcome::Applied)
    }

    async fn commit_transfer(
        &self,
        grant: &GrantedSkill,
        previous_owner: ProfileId,
        expected_times_used: u32,
    ) -> Result<TransitionOutcome, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE granted_skills SET player_id = ?, times_used = ?, body = ?
            WHERE id = ? AND player_id = ? AND times_used = ?
            "#,
        )
        .bind(grant.player_id().to_string())
        .bind(i64::from(grant.times_used()))
        .bind(to_json(grant)?)
        .bind(grant.id().to_string())
        .bind(previous_owner.to_string())
        .bind(i64::from(expected_times_used))
        .execute(&self.pool)
        .await
        .map_err(db("granted_skills.commit_transfer"))?;

        Ok(if result.rows_affected() == 0 {
            TransitionOutcome::AlreadyResolved
        } else {
            TransitionOutcome::Applied
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use covenant_domain::{ReusePolicy, Role, SkillEffects};

    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_store;

    #[tokio::test]
    async fn commit_use_is_optimistic_on_times_used() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();
        let profile = Profile::new("Derrick", Role::Player, now);
        let grant = GrantedSkill::new(
            profile.id(),
            SkillId::new(),
            ProfileId::new(),
            "Sun's blessing",
            ReusePolicy::Once,
            SkillEffects::default(),
            now,
        )
        .unwrap();
        GrantedSkillRepo::save(&store, &grant).await.unwrap();

        let mut first = grant.clone();
        first.record_use(now);
        let mut second = grant.clone();
        second.record_use(now);

        assert_eq!(
            store.commit_use(&first, 0, &profile).await.unwrap(),
            TransitionOutcome::Applied
        );
        assert_eq!(
            store.commit_use(&second, 0, &profile).await.unwrap(),
            TransitionOutcome::AlreadyResolved
        );

        let stored = GrantedSkillRepo::get(&store, grant.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.times_used(), 1);
        assert!(!stored.is_active());
    }

    #[tokio::test]
    async fn cast_started_before_a_transfer_cannot_commit() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();
        let owner = Profile::new("Klein", Role::Player, now);
        let heir = ProfileId::new();
        let grant = GrantedSkill::new(
            owner.id(),
            SkillId::new(),
            ProfileId::new(),
            "Heirloom",
            ReusePolicy::Unlimited,
            SkillEffects::default(),
            now,
        )
        .unwrap()
        .with_transferable(true);
        GrantedSkillRepo::save(&store, &grant).await.unwrap();

        // A cast reads the unused grant, then the owner hands it on.
        let mut cast = grant.clone();
        cast.record_use(now);
        let mut moved = grant.clone();
        moved.transfer_to(heir).unwrap();
        assert_eq!(
            store.commit_transfer(&moved, owner.id(), 0).await.unwrap(),
            TransitionOutcome::Applied
        );

        // The counter matches again after the reset; only the owner differs.
        assert_eq!(
            store.commit_use(&cast, 0, &owner).await.unwrap(),
            TransitionOutcome::AlreadyResolved
        );
        assert_eq!(
            store.commit_transfer(&moved, owner.id(), 0).await.unwrap(),
            TransitionOutcome::AlreadyResolved
        );

        let stored = GrantedSkillRepo::get(&store, grant.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.player_id(), heir);
        assert_eq!(stored.times_used(), 0);
    }

    #[tokio::test]
    async fn skill_round_trips() {
        let (store, _dir) = temp_store().await;
        let skill = Skill::new("Spirit Vision", 9, 2).unwrap();
        SkillRepo::save(&store, &skill).await.unwrap();
        let loaded = SkillRepo::get(&store, skill.id).await.unwrap().unwrap();
        assert_eq!(loaded, skill);
    }
}
