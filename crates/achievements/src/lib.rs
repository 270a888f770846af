mod catalog;
mod engine;
mod error;
mod presenter;
mod signal;
mod store;

pub use catalog::{BadgeCatalog, BadgeDefinition, MilestoneCondition, MilestoneRule, Rarity};
pub use engine::{AchievementEngine, AwardView};
pub use error::AchievementError;
pub use presenter::{
    CelebrationPhase, CelebrationPresenter, ClaimOutcome, ClaimSink, PresenterTimings,
};
pub use signal::{MemorySignalSource, PgSignalSource, SignalSource, SignalTarget};
pub use store::{AwardStore, EarnedAward, InsertOutcome, MemoryAwardStore, PgAwardStore};
