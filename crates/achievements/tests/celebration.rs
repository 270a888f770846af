use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Uuid;
use tokio::sync::Mutex;
use tokio::time::advance;

use murmur_achievements::{
    AchievementEngine, AchievementError, AwardView, BadgeCatalog, CelebrationPhase,
    CelebrationPresenter, ClaimOutcome, ClaimSink, EarnedAward, MemoryAwardStore,
    MemorySignalSource, PresenterTimings,
};

const REVEAL: Duration = Duration::from_millis(120);
const IDLE: Duration = Duration::from_millis(1400);

/// Engine with three unseen awards for one user (the three post badges).
async fn engine_with_three_unseen() -> (Arc<AchievementEngine>, Uuid) {
    let signals = Arc::new(MemorySignalSource::new());
    let user = Uuid::new_v4();
    signals.put_user(user).await;
    signals.set_count(user, "posts", 50).await;

    let engine = Arc::new(AchievementEngine::new(
        Arc::new(BadgeCatalog::standard()),
        signals,
        Arc::new(MemoryAwardStore::new()),
    ));
    engine.check_and_award(user).await.unwrap();
    (engine, user)
}

fn view(catalog: &BadgeCatalog, user: Uuid, key: &str) -> AwardView {
    AwardView {
        award: EarnedAward::new(user, key),
        badge: catalog.definition(key).unwrap().clone(),
    }
}

#[tokio::test(start_paused = true)]
async fn claim_is_ignored_until_idle() -> Result<()> {
    let (engine, user) = engine_with_three_unseen().await;
    let views = engine.get_unseen(user).await?;
    let mut presenter = CelebrationPresenter::new(views, engine.clone());

    assert_eq!(presenter.phase(), CelebrationPhase::Enter);
    assert_eq!(presenter.claim().await, ClaimOutcome::Ignored);
    assert_eq!(presenter.phase(), CelebrationPhase::Enter);

    advance(REVEAL).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Reveal);
    assert_eq!(presenter.claim().await, ClaimOutcome::Ignored);
    assert_eq!(presenter.phase(), CelebrationPhase::Reveal);

    // no mark-seen went out while claims were being ignored
    assert_eq!(engine.get_unseen(user).await?.len(), 3);

    advance(IDLE).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Idle);
    assert_eq!(presenter.claim().await, ClaimOutcome::Advanced);
    assert_eq!(engine.get_unseen(user).await?.len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn full_run_completes_once_and_drains_queue() -> Result<()> {
    let (engine, user) = engine_with_three_unseen().await;
    let views = engine.get_unseen(user).await?;
    assert_eq!(views.len(), 3);
    let mut presenter = CelebrationPresenter::new(views, engine.clone());

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        advance(REVEAL + IDLE).await;
        presenter.tick();
        assert_eq!(presenter.phase(), CelebrationPhase::Idle);
        outcomes.push(presenter.claim().await);
    }

    assert_eq!(
        outcomes,
        vec![
            ClaimOutcome::Advanced,
            ClaimOutcome::Advanced,
            ClaimOutcome::Completed,
        ]
    );
    assert!(presenter.is_complete());
    assert!(presenter.current().is_none());

    // completion fires once; everything after is ignored
    assert_eq!(presenter.claim().await, ClaimOutcome::Ignored);
    assert!(engine.get_unseen(user).await?.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn long_gap_cascades_straight_to_idle() -> Result<()> {
    let (engine, user) = engine_with_three_unseen().await;
    let views = engine.get_unseen(user).await?;
    let mut presenter = CelebrationPresenter::new(views, engine.clone());

    advance(Duration::from_secs(30)).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn empty_queue_is_complete_from_the_start() -> Result<()> {
    let (engine, _user) = engine_with_three_unseen().await;
    let mut presenter = CelebrationPresenter::new(Vec::new(), engine.clone());

    assert!(presenter.is_complete());
    assert!(presenter.current().is_none());
    assert_eq!(presenter.claim().await, ClaimOutcome::Ignored);
    Ok(())
}

/// Sink whose mark-seen always fails, standing in for a flaky backend.
struct FailingSink;

#[async_trait]
impl ClaimSink for FailingSink {
    async fn mark_seen(&self, award_id: Uuid) -> Result<(), AchievementError> {
        Err(AchievementError::Storage(anyhow::anyhow!(
            "mark_seen failed for {}",
            award_id
        )))
    }
}

#[tokio::test(start_paused = true)]
async fn mark_seen_failure_still_advances() -> Result<()> {
    let catalog = BadgeCatalog::standard();
    let user = Uuid::new_v4();
    let views = vec![
        view(&catalog, user, "first_whisper"),
        view(&catalog, user, "firestarter"),
    ];
    let mut presenter = CelebrationPresenter::new(views, Arc::new(FailingSink));

    advance(REVEAL + IDLE).await;
    presenter.tick();
    assert_eq!(presenter.claim().await, ClaimOutcome::Advanced);

    advance(REVEAL + IDLE).await;
    presenter.tick();
    assert_eq!(presenter.claim().await, ClaimOutcome::Completed);
    assert!(presenter.is_complete());
    Ok(())
}

/// Sink that records every mark-seen it receives.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl ClaimSink for RecordingSink {
    async fn mark_seen(&self, award_id: Uuid) -> Result<(), AchievementError> {
        self.calls.lock().await.push(award_id);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn exactly_one_mark_seen_per_badge_in_queue_order() -> Result<()> {
    let catalog = BadgeCatalog::standard();
    let user = Uuid::new_v4();
    let views = vec![
        view(&catalog, user, "first_whisper"),
        view(&catalog, user, "firestarter"),
        view(&catalog, user, "town_crier"),
    ];
    let expected: Vec<Uuid> = views.iter().map(|v| v.award.id).collect();

    let sink = Arc::new(RecordingSink::default());
    let mut presenter = CelebrationPresenter::new(views, sink.clone());

    // early claims must not reach the sink
    assert_eq!(presenter.claim().await, ClaimOutcome::Ignored);

    for _ in 0..3 {
        advance(REVEAL + IDLE).await;
        presenter.tick();
        presenter.claim().await;
    }

    assert_eq!(*sink.calls.lock().await, expected);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_timings_drive_the_phase_clock() -> Result<()> {
    let catalog = BadgeCatalog::standard();
    let user = Uuid::new_v4();
    let views = vec![view(&catalog, user, "first_whisper")];

    let timings = PresenterTimings {
        reveal_delay: Duration::from_millis(10),
        idle_delay: Duration::from_millis(20),
    };
    let mut presenter =
        CelebrationPresenter::with_timings(views, Arc::new(RecordingSink::default()), timings);

    advance(Duration::from_millis(9)).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Enter);

    advance(Duration::from_millis(1)).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Reveal);

    advance(Duration::from_millis(20)).await;
    presenter.tick();
    assert_eq!(presenter.phase(), CelebrationPhase::Idle);
    Ok(())
}
