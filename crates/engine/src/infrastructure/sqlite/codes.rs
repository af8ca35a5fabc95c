use async_trait::async_trait;
use covenant_domain::{Code, CodeId};

use super::{db, from_json, to_json, SqliteStore};
use crate::infrastructure::ports::{CodeRepo, RepoError};

#[async_trait]
impl CodeRepo for SqliteStore {
    async fn get(&self, id: CodeId) -> Result<Option<Code>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM codes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("codes.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Code>, RepoError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM codes WHERE code = ? AND archived = 0")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(db("codes.get_by_code"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn code_exists(&self, code: &str) -> Result<bool, RepoError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM codes WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db("codes.code_exists"))?;
        Ok(found.is_some())
    }

    async fn save(&self, code: &Code) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO codes (id, code, kind, archived, body)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                kind = excluded.kind,
                archived = excluded.archived,
                body = excluded.body
            "#,
        )
        .bind(code.id().to_string())
        .bind(code.code().as_str())
        .bind(code.kind().as_str())
        .bind(code.is_archived())
        .bind(to_json(code)?)
        .execute(&self.pool)
        .await
        .map_err(db("codes.save"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use covenant_domain::{CodeKind, ProfileId, ResourceDelta, ShortCode};

    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_store;

    fn code(short: &str) -> Code {
        Code::new(
            CodeKind::Action,
            "Patrol the docks",
            ShortCode::new(short).unwrap(),
            ResourceDelta::ZERO.with_travel(1),
            ProfileId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn archived_code_is_hidden_from_lookup_but_still_exists() {
        let (store, _dir) = temp_store().await;
        let mut c = code("01-02-25-abcd");
        CodeRepo::save(&store, &c).await.unwrap();
        assert!(store.get_by_code("01-02-25-abcd").await.unwrap().is_some());

        c.archive();
        CodeRepo::save(&store, &c).await.unwrap();
        assert!(store.get_by_code("01-02-25-abcd").await.unwrap().is_none());
        assert!(store.code_exists("01-02-25-abcd").await.unwrap());
        assert!(CodeRepo::get(&store, c.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_short_code_is_a_constraint_violation() {
        let (store, _dir) = temp_store().await;
        CodeRepo::save(&store, &code("dup")).await.unwrap();
        let err = CodeRepo::save(&store, &code("dup")).await.unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));
    }
}
