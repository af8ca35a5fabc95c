use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covenant_domain::{CodeId, Profile, ProfileId, Submission, SubmissionId, SubmissionKind};

use super::profiles::upsert_profile;
use super::{count, db, from_json, from_rows, to_json, ts, SqliteStore};
use crate::infrastructure::ports::{RepoError, SubmissionRepo, TransitionOutcome};

impl SqliteStore {
    async fn resolve_inner(
        &self,
        submission: &Submission,
        profile: Option<&Profile>,
    ) -> Result<TransitionOutcome, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db("submissions.resolve"))?;

        let result = sqlx::query(
            "UPDATE submissions SET status = ?, body = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(submission.status().as_str())
        .bind(to_json(submission)?)
        .bind(submission.id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(db("submissions.resolve"))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Ok(TransitionOutcome::AlreadyResolved);
        }

        if let Some(profile) = profile {
            upsert_profile(&mut *tx, profile).await?;
        }

        tx.commit().await.map_err(db("submissions.resolve"))?;
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl SubmissionRepo for SqliteStore {
    async fn insert(&self, submission: &Submission) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, kind, player_id, code_id, status, created_at, body)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submission.id().to_string())
        .bind(submission.kind().as_str())
        .bind(submission.player_id().to_string())
        .bind(submission.code_id().map(|id| id.to_string()))
        .bind(submission.status().as_str())
        .bind(ts(submission.created_at()))
        .bind(to_json(submission)?)
        .execute(&self.pool)
        .await
        .map_err(db("submissions.insert"))?;
        Ok(())
    }

    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, RepoError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM submissions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("submissions.get"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn get_pending(
        &self,
        kind: SubmissionKind,
        id: SubmissionId,
    ) -> Result<Option<Submission>, RepoError> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM submissions WHERE id = ? AND kind = ? AND status = 'pending'",
        )
        .bind(id.to_string())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("submissions.get_pending"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn find_pending_by_prefix(
        &self,
        kind: SubmissionKind,
        prefix: &str,
    ) -> Result<Option<Submission>, RepoError> {
        // Callers restrict `prefix` to [0-9a-f-], so it carries no LIKE wildcards.
        let body: Option<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM submissions
            WHERE kind = ? AND status = 'pending' AND id LIKE ?
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(kind.as_str())
        .bind(format!("{prefix}%"))
        .fetch_optional(&self.pool)
        .await
        .map_err(db("submissions.find_pending_by_prefix"))?;
        body.as_deref().map(from_json).transpose()
    }

    async fn list_pending_created_before(
        &self,
        kind: SubmissionKind,
        before: DateTime<Utc>,
    ) -> Result<Vec<Submission>, RepoError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM submissions
            WHERE kind = ? AND status = 'pending' AND created_at < ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(ts(before))
        .fetch_all(&self.pool)
        .await
        .map_err(db("submissions.list_pending_created_before"))?;
        from_rows(bodies)
    }

    async fn count_non_rejected(
        &self,
        player: ProfileId,
        code: CodeId,
    ) -> Result<u32, RepoError> {
        let n: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE player_id = ? AND code_id = ? AND status != 'rejected'
            "#,
        )
        .bind(player.to_string())
        .bind(code.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db("submissions.count_non_rejected"))?;
        Ok(count(n))
    }

    async fn count_since(
        &self,
        player: ProfileId,
        kind: SubmissionKind,
        since: DateTime<Utc>,
    ) -> Result<u32, RepoError> {
        let n: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE player_id = ? AND kind = ? AND created_at >= ?
            "#,
        )
        .bind(player.to_string())
        .bind(kind.as_str())
        .bind(ts(since))
        .fetch_one(&self.pool)
        .await
        .map_err(db("submissions.count_since"))?;
        Ok(count(n))
    }

    async fn has_approved_since(
        &self,
        players: &[ProfileId],
        code: CodeId,
        since: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        if players.is_empty() {
            return Ok(false);
        }

        let placeholders = vec!["?"; players.len()].join(", ");
        let query = format!(
            r#"
            SELECT 1 FROM submissions
            WHERE code_id = ? AND status = 'approved' AND created_at >= ?
              AND player_id IN ({placeholders})
            LIMIT 1
            "#
        );

        let mut q = sqlx::query_scalar::<_, i64>(&query)
            .bind(code.to_string())
            .bind(ts(since));
        for player in players {
            q = q.bind(player.to_string());
        }

        let found = q
            .fetch_optional(&self.pool)
            .await
            .map_err(db("submissions.has_approved_since"))?;
        Ok(found.is_some())
    }

    async fn resolve(&self, submission: &Submission) -> Result<TransitionOutcome, RepoError> {
        self.resolve_inner(submission, None).await
    }

    async fn resolve_with_profile(
        &self,
        submission: &Submission,
        profile: &Profile,
    ) -> Result<TransitionOutcome, RepoError> {
        self.resolve_inner(submission, Some(profile)).await
    }
}
