mod memory;
mod postgres;

pub use memory::MemoryAwardStore;
pub use postgres::PgAwardStore;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use murmur_common::get_current_timestamp;

use crate::error::AchievementError;

/// One earned badge. At most one row ever exists per `(user_id,
/// badge_key)` pair; `seen` is the only field that changes after insert,
/// and rows are never deleted.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct EarnedAward {
    pub id: Uuid,

    pub user_id: Uuid,
    pub badge_key: String,

    /// Flipped to true once the user has sat through the celebration.
    pub seen: bool,

    /// Unix seconds; the instant the badge was earned.
    pub created_at: i64,
    pub updated_at: i64,
}

impl EarnedAward {
    pub fn new(user_id: Uuid, badge_key: &str) -> Self {
        let now = get_current_timestamp();
        Self {
            id: Uuid::new_v4(),
            user_id,
            badge_key: badge_key.to_string(),
            seen: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What an insert attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The `(user_id, badge_key)` pair already existed: a concurrent
    /// evaluation won the race. Callers treat this as success.
    Duplicate,
}

/// Persistence seam for earned awards. `unseen` and `all_for_user`
/// return awards ordered oldest-earned-first.
#[async_trait]
pub trait AwardStore: Send + Sync {
    async fn earned_keys(&self, user_id: Uuid) -> Result<HashSet<String>, AchievementError>;

    async fn insert(&self, award: EarnedAward) -> Result<InsertOutcome, AchievementError>;

    async fn unseen(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError>;

    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError>;

    /// Returns false when no award with `award_id` exists. Marking an
    /// already-seen award is a quiet success.
    async fn mark_seen(&self, award_id: Uuid) -> Result<bool, AchievementError>;
}
