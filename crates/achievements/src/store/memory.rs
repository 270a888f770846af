use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::types::Uuid;
use tokio::sync::Mutex;

use murmur_common::get_current_timestamp;

use crate::error::AchievementError;

use super::{AwardStore, EarnedAward, InsertOutcome};

/// In-memory reference store. Awards keep insertion order, so equal
/// timestamps stay stable under the oldest-first sort.
#[derive(Default)]
pub struct MemoryAwardStore {
    awards: Mutex<Vec<EarnedAward>>,
}

impl MemoryAwardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AwardStore for MemoryAwardStore {
    async fn earned_keys(&self, user_id: Uuid) -> Result<HashSet<String>, AchievementError> {
        let awards = self.awards.lock().await;
        Ok(awards
            .iter()
            .filter(|award| award.user_id == user_id)
            .map(|award| award.badge_key.clone())
            .collect())
    }

    async fn insert(&self, award: EarnedAward) -> Result<InsertOutcome, AchievementError> {
        let mut awards = self.awards.lock().await;
        // the same check the unique index performs in Postgres, held
        // under the store lock
        let duplicate = awards
            .iter()
            .any(|existing| existing.user_id == award.user_id && existing.badge_key == award.badge_key);
        if duplicate {
            return Ok(InsertOutcome::Duplicate);
        }
        awards.push(award);
        Ok(InsertOutcome::Inserted)
    }

    async fn unseen(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError> {
        let awards = self.awards.lock().await;
        let mut unseen: Vec<EarnedAward> = awards
            .iter()
            .filter(|award| award.user_id == user_id && !award.seen)
            .cloned()
            .collect();
        unseen.sort_by_key(|award| award.created_at);
        Ok(unseen)
    }

    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<EarnedAward>, AchievementError> {
        let awards = self.awards.lock().await;
        let mut all: Vec<EarnedAward> = awards
            .iter()
            .filter(|award| award.user_id == user_id)
            .cloned()
            .collect();
        all.sort_by_key(|award| award.created_at);
        Ok(all)
    }

    async fn mark_seen(&self, award_id: Uuid) -> Result<bool, AchievementError> {
        let mut awards = self.awards.lock().await;
        match awards.iter_mut().find(|award| award.id == award_id) {
            Some(award) => {
                award.seen = true;
                award.updated_at = get_current_timestamp();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
