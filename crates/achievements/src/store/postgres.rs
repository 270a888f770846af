use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Uuid;
use sqlx::PgPool;

use murmur_common::get_current_timestamp;
use murmur_database::SqlxSchema;

use crate::error::AchievementError;

use super::{AwardStore, EarnedAward, InsertOutcome};

impl SqlxSchema for EarnedAward {
    const TABLE_NAME: &'static str = "user_awards";
    const ID_COLUMN_NAME: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "badge_key", "seen", "created_at", "updated_at"];
    // The unique index is the at-most-once mechanism for concurrent
    // evaluations; inserts rely on it via ON CONFLICT DO NOTHING.
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_awards_user_badge ON \"user_awards\" (user_id, badge_key);",
        "CREATE INDEX IF NOT EXISTS idx_user_awards_user_seen ON \"user_awards\" (user_id, seen);",
    ];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "user_awards" (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            badge_key TEXT NOT NULL,
            seen BOOLEAN NOT NULL DEFAULT FALSE,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );"#
        .to_string()
    }

    fn drop_table_sql() -> String {
        "DROP TABLE IF EXISTS \"user_awards\" CASCADE;".to_string()
    }
}

pub struct PgAwardStore {
    pool: Arc<PgPool>,
}

impl PgAwardStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AwardStore for PgAwardStore {
    async fn earned_keys(&self, user_id: Uuid) -> Result<HashSet<String>, AchievementError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT badge_key FROM user_awards WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| AchievementError::Storage(e.into()))?;
        Ok(keys.into_iter().collect())
    }

    async fn insert(&self, award: EarnedAward) -> Result<InsertOutcome, AchievementError> {
        let result = sqlx::query(
            "INSERT INTO user_awards (id, user_id, badge_key, seen, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, badge_key) DO NOTHING",
        )
        .bind(award.id)
        .bind(award.user_id)
        .bind(&award.badge_key)
        .bind(award.seen)
        .bind(award.created_at)
        .bind(award.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| AchievementError::Storage(e.into()))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn unseen(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError> {
        sqlx::query_as::<_, EarnedAward>(
            "SELECT id, user_id, badge_key, seen, created_at, updated_at FROM user_awards \
             WHERE user_id = $1 AND seen = FALSE ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| AchievementError::Storage(e.into()))
    }

    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError> {
        sqlx::query_as::<_, EarnedAward>(
            "SELECT id, user_id, badge_key, seen, created_at, updated_at FROM user_awards \
             WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| AchievementError::Storage(e.into()))
    }

    async fn mark_seen(&self, award_id: Uuid) -> Result<bool, AchievementError> {
        let result = sqlx::query("UPDATE user_awards SET seen = TRUE, updated_at = $2 WHERE id = $1")
            .bind(award_id)
            .bind(get_current_timestamp())
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| AchievementError::Storage(e.into()))?;
        Ok(result.rows_affected() > 0)
    }
}
