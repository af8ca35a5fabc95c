//! SQLite-backed persistence.
//!
//! One pool, one store type implementing every repository port. Each table keeps
//! the aggregate as a JSON body plus the handful of columns queries filter on.
//! Timestamps are fixed-width RFC 3339 UTC strings so they compare as text.

mod activity;
mod codes;
mod map;
mod notifications;
mod profiles;
mod punishments;
mod roleplay;
mod skills;
mod submissions;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS codes (
        id TEXT PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL,
        archived INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS submissions (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        player_id TEXT NOT NULL,
        code_id TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_submissions_pending ON submissions (kind, status, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_submissions_player_code ON submissions (player_id, code_id)",
    r#"
    CREATE TABLE IF NOT EXISTS skills (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS granted_skills (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL,
        times_used INTEGER NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS punishments (
        id TEXT PRIMARY KEY,
        is_active INTEGER NOT NULL,
        archived INTEGER NOT NULL,
        deadline TEXT,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS punishment_players (
        punishment_id TEXT NOT NULL,
        player_id TEXT NOT NULL,
        settled INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL,
        PRIMARY KEY (punishment_id, player_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roleplay_submissions (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL,
        submitted_on TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (player_id, submitted_on)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roleplay_links (
        id TEXT PRIMARY KEY,
        submission_id TEXT NOT NULL,
        player_id TEXT NOT NULL,
        reviewed INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS map_tokens (
        id TEXT PRIMARY KEY,
        map_id TEXT NOT NULL,
        player_id TEXT,
        body TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_map_tokens_player ON map_tokens (player_id)",
    r#"
    CREATE TABLE IF NOT EXISTS landmarks (
        id TEXT PRIMARY KEY,
        map_id TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS activity_logs (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activity_logs_player ON activity_logs (player_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY,
        target_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
];

/// SQLite implementation of every repository port plus the notification outbox.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and applies the schema.
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| RepoError::database("migrate", e))?;
        }

        tracing::debug!(db_path, "SQLite store ready");
        Ok(Self { pool })
    }
}

// =============================================================================
// Row helpers
// =============================================================================

pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(RepoError::serialization)
}

pub(crate) fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, RepoError> {
    serde_json::from_str(body).map_err(RepoError::serialization)
}

pub(crate) fn from_rows<T: DeserializeOwned>(bodies: Vec<String>) -> Result<Vec<T>, RepoError> {
    bodies.iter().map(|body| from_json(body)).collect()
}

/// Maps a sqlx error, surfacing unique-key conflicts as constraint violations.
pub(crate) fn db(operation: &'static str) -> impl Fn(sqlx::Error) -> RepoError {
    move |e| match &e {
        sqlx::Error::Database(inner) if inner.is_unique_violation() => {
            RepoError::constraint(format!("{operation}: {inner}"))
        }
        _ => RepoError::database(operation, e),
    }
}

pub(crate) fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SqliteStore;

    /// A store backed by a throwaway database file. Keep the dir alive for the test.
    pub async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covenant-test.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }
}
