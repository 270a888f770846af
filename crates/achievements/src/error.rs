use sqlx::types::Uuid;
use thiserror::Error;

/// Failures surfaced to callers of the achievement engine.
///
/// Per-rule trouble during an evaluation pass (an unreachable counter
/// source, an insert race lost to a concurrent caller) is absorbed and
/// retried on the next pass; it never appears here.
#[derive(Debug, Error)]
pub enum AchievementError {
    #[error("[AchievementEngine] unknown user: {0}")]
    UnknownUser(Uuid),

    /// A badge key with no catalog entry. The catalog is compiled in, so
    /// hitting this means a miswired deployment, not a user condition.
    #[error("[BadgeCatalog] unknown badge key: {0}")]
    UnknownBadgeKey(String),

    #[error("[AchievementEngine] unknown award: {0}")]
    UnknownAward(Uuid),

    #[error("[AchievementEngine] storage failure")]
    Storage(#[source] anyhow::Error),
}
