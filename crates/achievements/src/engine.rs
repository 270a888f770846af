use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::catalog::{BadgeCatalog, BadgeDefinition, MilestoneCondition};
use crate::error::AchievementError;
use crate::presenter::ClaimSink;
use crate::signal::SignalSource;
use crate::store::{AwardStore, EarnedAward, InsertOutcome};

/// An earned award joined with its display metadata; the shape handed to
/// profile pages and the celebration presenter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AwardView {
    pub award: EarnedAward,
    pub badge: BadgeDefinition,
}

/// Evaluates milestone rules against the activity counters and owns all
/// reads and writes of earned awards. One instance per process; every
/// operation is scoped by the caller's user id.
pub struct AchievementEngine {
    catalog: Arc<BadgeCatalog>,
    signals: Arc<dyn SignalSource>,
    store: Arc<dyn AwardStore>,
}

impl AchievementEngine {
    pub fn new(
        catalog: Arc<BadgeCatalog>,
        signals: Arc<dyn SignalSource>,
        store: Arc<dyn AwardStore>,
    ) -> Self {
        Self {
            catalog,
            signals,
            store,
        }
    }

    /// Evaluates every milestone rule for `user_id` and awards whatever
    /// newly crossed its threshold. Returns the keys awarded by this
    /// call: counter badges in catalog order, dependency badges last.
    ///
    /// One unreachable counter never aborts the pass; the rule is
    /// skipped with a warning and retried on the next call. An insert
    /// lost to a concurrent caller counts as already-earned, not a
    /// failure. Awarding is idempotent: repeat calls return nothing new.
    pub async fn check_and_award(&self, user_id: Uuid) -> Result<Vec<String>, AchievementError> {
        self.ensure_user(user_id).await?;

        let earned = self.store.earned_keys(user_id).await?;
        let mut newly_awarded = Vec::new();

        for rule in self.catalog.counter_rules() {
            if earned.contains(&rule.badge_key) {
                continue;
            }
            let (signal, threshold) = match &rule.condition {
                MilestoneCondition::Counter { signal, threshold } => (signal, *threshold),
                MilestoneCondition::AllOf { .. } => continue,
            };

            let count = match self.signals.count(signal, user_id).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(
                        "[AchievementEngine::check_and_award] counter source unavailable for signal {:?}: {:?}",
                        signal,
                        e
                    );
                    continue;
                }
            };
            if count < threshold {
                continue;
            }

            if self.try_award(user_id, &rule.badge_key).await {
                newly_awarded.push(rule.badge_key.clone());
            }
        }

        // Dependency badges must observe awards granted above as well as
        // any granted by concurrent callers, so the earned set is
        // re-read rather than patched locally.
        let earned = match self.store.earned_keys(user_id).await {
            Ok(earned) => earned,
            Err(e) => {
                tracing::warn!(
                    "[AchievementEngine::check_and_award] could not re-read earned set, skipping dependency badges: {:?}",
                    e
                );
                return Ok(newly_awarded);
            }
        };
        for rule in self.catalog.dependency_rules() {
            if earned.contains(&rule.badge_key) {
                continue;
            }
            let keys = match &rule.condition {
                MilestoneCondition::AllOf { keys } => keys,
                MilestoneCondition::Counter { .. } => continue,
            };
            if !keys.iter().all(|key| earned.contains(key)) {
                continue;
            }

            if self.try_award(user_id, &rule.badge_key).await {
                newly_awarded.push(rule.badge_key.clone());
            }
        }

        Ok(newly_awarded)
    }

    /// Awards with `seen = false`, oldest earned first, for the
    /// celebration queue. An empty result is the common case.
    pub async fn get_unseen(&self, user_id: Uuid) -> Result<Vec<AwardView>, AchievementError> {
        self.ensure_user(user_id).await?;
        let awards = self.store.unseen(user_id).await?;
        self.join_catalog(awards)
    }

    /// Every award the user holds, seen or not, oldest earned first.
    /// The profile trophy case.
    pub async fn get_user_achievements(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AwardView>, AchievementError> {
        self.ensure_user(user_id).await?;
        let awards = self.store.all_for_user(user_id).await?;
        self.join_catalog(awards)
    }

    /// Marks one award as celebrated. Idempotent on already-seen awards.
    pub async fn mark_seen(&self, award_id: Uuid) -> Result<(), AchievementError> {
        if self.store.mark_seen(award_id).await? {
            Ok(())
        } else {
            Err(AchievementError::UnknownAward(award_id))
        }
    }

    /// Attempts the insert for one badge. True only when this call
    /// created the row; duplicates and storage failures both leave the
    /// pass running.
    async fn try_award(&self, user_id: Uuid, badge_key: &str) -> bool {
        match self.store.insert(EarnedAward::new(user_id, badge_key)).await {
            Ok(InsertOutcome::Inserted) => true,
            Ok(InsertOutcome::Duplicate) => {
                tracing::debug!(
                    "[AchievementEngine::try_award] {:?} already awarded to {}",
                    badge_key,
                    user_id
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    "[AchievementEngine::try_award] failed to insert {:?} for {}: {:?}",
                    badge_key,
                    user_id,
                    e
                );
                false
            }
        }
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), AchievementError> {
        let exists = self
            .signals
            .user_exists(user_id)
            .await
            .map_err(AchievementError::Storage)?;
        if exists {
            Ok(())
        } else {
            Err(AchievementError::UnknownUser(user_id))
        }
    }

    fn join_catalog(&self, awards: Vec<EarnedAward>) -> Result<Vec<AwardView>, AchievementError> {
        awards
            .into_iter()
            .map(|award| {
                let badge = self.catalog.definition(&award.badge_key)?.clone();
                Ok(AwardView { award, badge })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ClaimSink for AchievementEngine {
    async fn mark_seen(&self, award_id: Uuid) -> Result<(), AchievementError> {
        AchievementEngine::mark_seen(self, award_id).await
    }
}
