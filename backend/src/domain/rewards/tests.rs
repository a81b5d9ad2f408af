//! Tests for milestone rewards and surprise drops.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockRewardRepository, RemoteError};
use crate::domain::{NotificationKind, RuleConfig};
use crate::test_support::{MutableClock, RecordingNotificationSink};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 14, 18, 0, 0)
        .single()
        .expect("valid time")
}

#[fixture]
fn sink() -> Arc<RecordingNotificationSink> {
    Arc::new(RecordingNotificationSink::default())
}

fn milestones(repo: MockRewardRepository, sink: &Arc<RecordingNotificationSink>) -> MilestoneRewards {
    MilestoneRewards::new(Arc::new(repo), sink.clone(), &RuleConfig::default())
}

fn drops_with_probability(
    repo: MockRewardRepository,
    sink: &Arc<RecordingNotificationSink>,
    probability: f64,
    seed: u64,
) -> SurpriseDrops {
    let config = RuleConfig {
        surprise_drop_probability: probability,
        ..RuleConfig::default()
    };
    SurpriseDrops::with_rng(
        SurpriseDropPorts {
            repository: Arc::new(repo),
            notifications: sink.clone(),
            clock: Arc::new(MutableClock::new(now())),
        },
        &config,
        SmallRng::seed_from_u64(seed),
    )
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(6)]
#[case(8)]
#[case(9)]
#[case(11)]
#[case(14)]
#[case(70)]
#[tokio::test]
async fn non_milestone_streaks_never_call_the_grant_procedure(
    sink: Arc<RecordingNotificationSink>,
    #[case] streak: u32,
) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_streak_reward().never();

    let outcome = milestones(repo, &sink)
        .on_streak_updated(&UserId::random(), streak)
        .await;

    assert_eq!(outcome, MilestoneOutcome::NotMilestone);
    assert!(sink.notifications().is_empty());
}

#[rstest]
#[case(7, "7-Day Streak Reward")]
#[case(10, "10-Day Streak Reward")]
#[tokio::test]
async fn granted_milestone_shows_its_fixed_notification(
    sink: Arc<RecordingNotificationSink>,
    #[case] streak: u32,
    #[case] title: &str,
) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_streak_reward()
        .withf(move |_, count| *count == streak)
        .times(1)
        .return_once(|_, _| Ok(MilestoneGrant { granted: true }));

    let outcome = milestones(repo, &sink)
        .on_streak_updated(&UserId::random(), streak)
        .await;

    assert_eq!(outcome, MilestoneOutcome::Granted);
    assert_eq!(sink.titles(), vec![title.to_owned()]);
    assert_eq!(
        sink.notifications().first().map(|n| n.kind),
        Some(NotificationKind::Reward)
    );
}

#[rstest]
#[tokio::test]
async fn duplicate_milestone_is_silent(sink: Arc<RecordingNotificationSink>) {
    let mut repo = MockRewardRepository::new();
    let mut seq = mockall::Sequence::new();
    repo.expect_grant_streak_reward()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(MilestoneGrant { granted: true }));
    repo.expect_grant_streak_reward()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(MilestoneGrant { granted: false }));
    let rule = milestones(repo, &sink);
    let user = UserId::random();

    let first = rule.on_streak_updated(&user, 7).await;
    let second = rule.on_streak_updated(&user, 7).await;

    assert_eq!(first, MilestoneOutcome::Granted);
    assert_eq!(second, MilestoneOutcome::AlreadyGranted);
    assert_eq!(sink.titles(), vec!["7-Day Streak Reward".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn grant_failure_shows_nothing(sink: Arc<RecordingNotificationSink>) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_streak_reward()
        .times(1)
        .return_once(|_, _| Err(RemoteError::transport("gateway timeout")));

    let outcome = milestones(repo, &sink)
        .on_streak_updated(&UserId::random(), 10)
        .await;

    assert_eq!(outcome, MilestoneOutcome::Unavailable);
    assert!(sink.notifications().is_empty());
}

#[rstest]
fn configured_milestones_are_honoured(sink: Arc<RecordingNotificationSink>) {
    let config = RuleConfig {
        streak_milestones: vec![30],
        ..RuleConfig::default()
    };
    let rule = MilestoneRewards::new(
        Arc::new(MockRewardRepository::new()),
        sink.clone(),
        &config,
    );
    let outcome = futures::executor::block_on(rule.on_streak_updated(&UserId::random(), 7));
    assert_eq!(outcome, MilestoneOutcome::NotMilestone);
    assert_eq!(milestone_notification(30).title, "30-Day Streak Reward");
}

#[rstest]
#[case(7)]
#[case(2024)]
#[case(90_210)]
fn drop_rate_converges_to_configured_probability(
    sink: Arc<RecordingNotificationSink>,
    #[case] seed: u64,
) {
    const TRIALS: u32 = 10_000;
    let drops = drops_with_probability(MockRewardRepository::new(), &sink, 0.08, seed);

    let hits = (0..TRIALS).filter(|_| drops.roll().is_some()).count();

    let rate = hits as f64 / f64::from(TRIALS);
    assert!(
        (rate - 0.08).abs() <= 0.015,
        "observed drop rate {rate} outside 0.08 ± 0.015"
    );
}

#[rstest]
fn templates_are_drawn_uniformly(sink: Arc<RecordingNotificationSink>) {
    let drops = drops_with_probability(MockRewardRepository::new(), &sink, 1.0, 11);
    let mut counts: HashMap<RewardType, u32> = HashMap::new();

    for _ in 0..9_000 {
        let template = drops.roll().expect("probability one always drops");
        *counts.entry(template.reward_type).or_default() += 1;
    }

    assert_eq!(counts.len(), SURPRISE_TEMPLATES.len());
    for (reward_type, count) in counts {
        assert!(
            (2_700..=3_300).contains(&count),
            "{reward_type} drawn {count} times"
        );
    }
}

#[rstest]
#[tokio::test]
async fn successful_drop_inserts_a_day_long_grant(sink: Arc<RecordingNotificationSink>) {
    let user = UserId::random();
    let expected_user = user.clone();
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_exists_since()
        .withf(|_, _, since| *since == now() - TimeDelta::hours(24))
        .times(1)
        .return_once(|_, _, _| Ok(false));
    repo.expect_insert_grant()
        .withf(move |grant| {
            grant.user_id == expected_user
                && grant.trigger == "quest_completed"
                && grant.created_at == now()
                && grant.expires_at == Some(now() + TimeDelta::hours(24))
        })
        .times(1)
        .return_once(|_| Ok(()));
    let drops = drops_with_probability(repo, &sink, 1.0, 5);

    let outcome = drops.on_quest_completed(&user).await;

    let SurpriseOutcome::Granted(grant) = outcome else {
        panic!("expected a grant, got {outcome:?}");
    };
    assert_eq!(grant.value, grant.reward_type.default_payload());
    let notifications = sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(
        notifications
            .first()
            .is_some_and(|n| n.title.starts_with("Surprise!"))
    );
}

#[rstest]
#[case::recent_grant(Ok(true))]
#[case::check_failed(Err(RemoteError::transport("offline")))]
#[tokio::test]
async fn drop_is_suppressed_unless_window_is_provably_clear(
    sink: Arc<RecordingNotificationSink>,
    #[case] recent: Result<bool, RemoteError>,
) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_exists_since()
        .times(1)
        .return_once(move |_, _, _| recent);
    repo.expect_insert_grant().never();
    let drops = drops_with_probability(repo, &sink, 1.0, 5);

    let outcome = drops.on_quest_completed(&UserId::random()).await;

    assert!(matches!(outcome, SurpriseOutcome::Suppressed { .. }));
    assert!(sink.notifications().is_empty());
}

#[rstest]
#[tokio::test]
async fn failed_insert_is_not_announced(sink: Arc<RecordingNotificationSink>) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_exists_since()
        .return_once(|_, _, _| Ok(false));
    repo.expect_insert_grant()
        .times(1)
        .return_once(|_| Err(RemoteError::forbidden("rls")));
    let drops = drops_with_probability(repo, &sink, 1.0, 5);

    let outcome = drops.on_quest_completed(&UserId::random()).await;

    assert_eq!(outcome, SurpriseOutcome::Unavailable);
    assert!(sink.notifications().is_empty());
}

#[rstest]
#[tokio::test]
async fn zero_probability_never_touches_the_platform(sink: Arc<RecordingNotificationSink>) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_exists_since().never();
    repo.expect_insert_grant().never();
    let drops = drops_with_probability(repo, &sink, 0.0, 5);

    for _ in 0..100 {
        assert_eq!(
            drops.on_quest_completed(&UserId::random()).await,
            SurpriseOutcome::NoDrop
        );
    }
}

#[rstest]
#[tokio::test]
async fn unbounded_windows_clamp_instead_of_overflowing(sink: Arc<RecordingNotificationSink>) {
    let mut repo = MockRewardRepository::new();
    repo.expect_grant_exists_since()
        .withf(|_, _, since| *since == DateTime::<Utc>::MIN_UTC)
        .times(1)
        .return_once(|_, _, _| Ok(false));
    repo.expect_insert_grant()
        .withf(|grant| grant.expires_at.is_none())
        .times(1)
        .return_once(|_| Ok(()));
    let config = RuleConfig {
        surprise_drop_probability: 1.0,
        surprise_drop_window: TimeDelta::MAX,
        surprise_drop_expiry: TimeDelta::MAX,
        ..RuleConfig::default()
    };
    let drops = SurpriseDrops::with_rng(
        SurpriseDropPorts {
            repository: Arc::new(repo),
            notifications: sink.clone(),
            clock: Arc::new(MutableClock::new(now())),
        },
        &config,
        SmallRng::seed_from_u64(3),
    );

    let outcome = drops.on_quest_completed(&UserId::random()).await;

    assert!(matches!(outcome, SurpriseOutcome::Granted(_)));
}
