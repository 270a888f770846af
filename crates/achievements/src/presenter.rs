use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::types::Uuid;
use tokio::time::Instant;

use crate::engine::AwardView;
use crate::error::AchievementError;

/// The one call the presenter makes back into the engine.
#[async_trait]
pub trait ClaimSink: Send + Sync {
    async fn mark_seen(&self, award_id: Uuid) -> Result<(), AchievementError>;
}

/// Phases of one badge's celebration. `Enter` and `Reveal` advance on
/// timers; `Idle` waits for the user; `Exit` only ever follows a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CelebrationPhase {
    /// Initial render, fully transparent.
    Enter,
    /// Emphasis animation; presentational only.
    Reveal,
    /// Steady display. The only phase that honors a claim.
    Idle,
    /// Claim accepted, mark-seen in flight.
    Exit,
}

/// Delays for the two automatic transitions: `Enter -> Reveal` after
/// `reveal_delay`, `Reveal -> Idle` after a further `idle_delay`.
#[derive(Debug, Clone, Copy)]
pub struct PresenterTimings {
    pub reveal_delay: Duration,
    pub idle_delay: Duration,
}

impl Default for PresenterTimings {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(120),
            idle_delay: Duration::from_millis(1400),
        }
    }
}

/// What a claim attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claim arrived outside `Idle`, or after the run finished.
    /// Nothing happened; no mark-seen was issued.
    Ignored,
    /// Current badge dismissed; the next one is rendering.
    Advanced,
    /// The last badge was dismissed. Returned exactly once per run.
    Completed,
}

/// Walks an ordered unseen-award queue through the celebration
/// timeline, one badge at a time. The host UI calls `tick` from its
/// render loop and `claim` on user input; timers run on the tokio
/// clock, so tests drive them with a paused runtime.
pub struct CelebrationPresenter {
    queue: Vec<AwardView>,
    sink: Arc<dyn ClaimSink>,
    timings: PresenterTimings,

    index: usize,
    phase: CelebrationPhase,
    phase_entered_at: Instant,
}

impl CelebrationPresenter {
    pub fn new(queue: Vec<AwardView>, sink: Arc<dyn ClaimSink>) -> Self {
        Self::with_timings(queue, sink, PresenterTimings::default())
    }

    pub fn with_timings(
        queue: Vec<AwardView>,
        sink: Arc<dyn ClaimSink>,
        timings: PresenterTimings,
    ) -> Self {
        Self {
            queue,
            sink,
            timings,
            index: 0,
            phase: CelebrationPhase::Enter,
            phase_entered_at: Instant::now(),
        }
    }

    /// The badge currently on screen, if the run is still going.
    pub fn current(&self) -> Option<&AwardView> {
        self.queue.get(self.index)
    }

    pub fn phase(&self) -> CelebrationPhase {
        self.phase
    }

    /// True once every queued badge has been claimed. An empty queue is
    /// complete from the start.
    pub fn is_complete(&self) -> bool {
        self.index >= self.queue.len()
    }

    /// Applies any timer transitions that have come due. A large gap
    /// between ticks cascades Enter -> Reveal -> Idle in one call.
    pub fn tick(&mut self) {
        if self.is_complete() {
            return;
        }
        let now = Instant::now();
        if self.phase == CelebrationPhase::Enter
            && now.duration_since(self.phase_entered_at) >= self.timings.reveal_delay
        {
            self.phase = CelebrationPhase::Reveal;
            self.phase_entered_at += self.timings.reveal_delay;
        }
        if self.phase == CelebrationPhase::Reveal
            && now.duration_since(self.phase_entered_at) >= self.timings.idle_delay
        {
            self.phase = CelebrationPhase::Idle;
            self.phase_entered_at = now;
        }
    }

    /// The user's dismiss action. Honored only from `Idle`: a claim
    /// while the badge is still entering or revealing does nothing, so
    /// the reveal cannot be raced by an eager click.
    ///
    /// On honor, exactly one mark-seen is issued for the current badge.
    /// If that write fails the presenter still advances; the badge
    /// stays unseen server-side and resurfaces next session, and the
    /// celebration must not wedge on a transient failure.
    pub async fn claim(&mut self) -> ClaimOutcome {
        if self.is_complete() || self.phase != CelebrationPhase::Idle {
            return ClaimOutcome::Ignored;
        }
        self.phase = CelebrationPhase::Exit;

        let award_id = self.queue[self.index].award.id;
        if let Err(e) = self.sink.mark_seen(award_id).await {
            tracing::warn!(
                "[CelebrationPresenter::claim] mark_seen failed for {}: {:?}",
                award_id,
                e
            );
        }

        self.index += 1;
        if self.index == self.queue.len() {
            ClaimOutcome::Completed
        } else {
            self.phase = CelebrationPhase::Enter;
            self.phase_entered_at = Instant::now();
            ClaimOutcome::Advanced
        }
    }
}
