//! Session facade wiring every rule for one signed-in user.
//!
//! Flags are fetched once at session start. The cached set only decides what
//! may render optimistically; an optional rule runs once the server-side
//! rollout check for its flag agrees.

use std::sync::Arc;

use mockable::Clock;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::ports::{
    AuthSession, EntitlementRepository, ErrorReporter, FeatureFlagSource, KeyValueStore,
    LeagueRepository, NotificationSink, ProtectionRepository, RewardRepository,
};
use crate::domain::{
    Celebration, CelebrationTracker, EntitlementPorts, EntitlementReconciler, FeatureBoundary,
    FeatureFlag, FeatureFlagGate, FeatureFlagSet, LeagueStanding, LeagueStandings,
    MilestoneOutcome, MilestoneRewards, PollHandle, Protection, ProtectionMonitor,
    ReconcileOutcome, ReminderPorts, ReminderScheduler, RuleConfig, RuleConfigError, Sleeper,
    SurpriseDropPorts, SurpriseDrops, SurpriseOutcome, UserId, UserProgress,
};

/// Every collaborator a session needs.
pub struct SessionPorts {
    /// Feature flag reads and rollout checks.
    pub flags: Arc<dyn FeatureFlagSource>,
    /// Payment, premium and subscription state.
    pub entitlements: Arc<dyn EntitlementRepository>,
    /// Session token refresh.
    pub auth: Arc<dyn AuthSession>,
    /// Reward ledger.
    pub rewards: Arc<dyn RewardRepository>,
    /// League data.
    pub leagues: Arc<dyn LeagueRepository>,
    /// Power-up rows.
    pub protection: Arc<dyn ProtectionRepository>,
    /// Remote error log for feature boundaries.
    pub reporter: Arc<dyn ErrorReporter>,
    /// Device key-value store.
    pub store: Arc<dyn KeyValueStore>,
    /// Toasts and banners.
    pub notifications: Arc<dyn NotificationSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Delay implementation.
    pub sleeper: Arc<dyn Sleeper>,
}

/// What session start produced.
pub struct SessionStart {
    /// Flags fetched for this session.
    pub flags: FeatureFlagSet,
    /// Background entitlement reconciliation.
    pub reconciliation: JoinHandle<ReconcileOutcome>,
}

/// Rule outcomes for one quest completion. `None` means the rule's flag is
/// off.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestRewards {
    /// Milestone rule outcome.
    pub milestone: Option<MilestoneOutcome>,
    /// Surprise drop rule outcome.
    pub surprise: Option<SurpriseOutcome>,
}

/// Business rules for one signed-in user.
pub struct QuestSession {
    user_id: UserId,
    gate: FeatureFlagGate,
    reconciler: Arc<EntitlementReconciler>,
    milestones: MilestoneRewards,
    drops: SurpriseDrops,
    standings: LeagueStandings,
    protection: Arc<ProtectionMonitor>,
    celebrations: CelebrationTracker,
    reminders: Arc<ReminderScheduler>,
    reporter: Arc<dyn ErrorReporter>,
}

impl QuestSession {
    /// Wire a session with an entropy-seeded random source.
    pub fn new(
        user_id: UserId,
        ports: SessionPorts,
        config: &RuleConfig,
    ) -> Result<Self, RuleConfigError> {
        Self::with_rng(user_id, ports, config, SmallRng::from_entropy())
    }

    /// Wire a session with an explicit random source for surprise drops.
    pub fn with_rng(
        user_id: UserId,
        ports: SessionPorts,
        config: &RuleConfig,
        rng: SmallRng,
    ) -> Result<Self, RuleConfigError> {
        config.validate()?;
        let SessionPorts {
            flags,
            entitlements,
            auth,
            rewards,
            leagues,
            protection,
            reporter,
            store,
            notifications,
            clock,
            sleeper,
        } = ports;

        let reconciler = EntitlementReconciler::new(
            EntitlementPorts {
                repository: Arc::clone(&entitlements),
                session: auth,
                notifications: Arc::clone(&notifications),
            },
            Arc::clone(&clock),
            sleeper,
            config,
        );
        let drops = SurpriseDrops::with_rng(
            SurpriseDropPorts {
                repository: Arc::clone(&rewards),
                notifications: Arc::clone(&notifications),
                clock: Arc::clone(&clock),
            },
            config,
            rng,
        );
        let reminders = ReminderScheduler::new(
            ReminderPorts {
                subscriptions: entitlements,
                store: Arc::clone(&store),
                notifications: Arc::clone(&notifications),
                clock: Arc::clone(&clock),
            },
            config,
        );

        Ok(Self {
            gate: FeatureFlagGate::new(flags, user_id.clone()),
            reconciler: Arc::new(reconciler),
            milestones: MilestoneRewards::new(rewards, Arc::clone(&notifications), config),
            drops,
            standings: LeagueStandings::new(leagues, Arc::clone(&clock)),
            protection: Arc::new(ProtectionMonitor::new(protection, clock, config)),
            celebrations: CelebrationTracker::new(store, notifications),
            reminders: Arc::new(reminders),
            reporter,
            user_id,
        })
    }

    /// User this session belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Flag gate for this session.
    pub fn gate(&self) -> &FeatureFlagGate {
        &self.gate
    }

    /// Fetch flags and schedule entitlement reconciliation.
    pub async fn start(&self) -> SessionStart {
        let flags = self.gate.fetch_flags().await;
        let reconciliation = self.reconciler.schedule(self.user_id.clone());
        info!(user_id = %self.user_id, "session started");
        SessionStart {
            flags,
            reconciliation,
        }
    }

    /// Whether `flag` is on for this user: published in the cached set and
    /// confirmed by the rollout check. A flag off in the cached set is never
    /// checked remotely.
    pub async fn feature_enabled(&self, flag: FeatureFlag) -> bool {
        self.gate.is_enabled(flag) && self.gate.check_rollout(flag).await
    }

    /// Run the reward rules whose flags are on.
    pub async fn on_quest_completed(&self, streak_count: u32) -> QuestRewards {
        let (milestone_enabled, surprise_enabled) = tokio::join!(
            self.feature_enabled(FeatureFlag::MilestoneRewards),
            self.feature_enabled(FeatureFlag::SurpriseDrops),
        );
        let (milestone, surprise) = tokio::join!(
            async {
                if milestone_enabled {
                    Some(
                        self.milestones
                            .on_streak_updated(&self.user_id, streak_count)
                            .await,
                    )
                } else {
                    None
                }
            },
            async {
                if surprise_enabled {
                    Some(self.drops.on_quest_completed(&self.user_id).await)
                } else {
                    None
                }
            },
        );
        QuestRewards {
            milestone,
            surprise,
        }
    }

    /// League standing, when leagues are on.
    pub async fn league_standing(&self) -> Option<LeagueStanding> {
        if !self.feature_enabled(FeatureFlag::Leagues).await {
            return None;
        }
        self.standings.standing(&self.user_id).await
    }

    /// Start polling protection status, when power-ups are on.
    pub async fn watch_protection(
        &self,
    ) -> Option<(watch::Receiver<Option<Protection>>, PollHandle)> {
        self.feature_enabled(FeatureFlag::PowerUps)
            .await
            .then(|| self.protection.watch(self.user_id.clone()))
    }

    /// Start hourly subscription reminders, when premium is on.
    pub async fn watch_reminders(&self) -> Option<PollHandle> {
        self.feature_enabled(FeatureFlag::Premium)
            .await
            .then(|| self.reminders.watch(self.user_id.clone()))
    }

    /// Show celebrations due for `progress`.
    pub fn celebrate(&self, progress: &UserProgress) -> Vec<Celebration> {
        self.celebrations.celebrate(&self.user_id, progress)
    }

    /// Isolation boundary for `feature` mounted on `location`.
    pub fn boundary(&self, feature: FeatureFlag, location: impl Into<String>) -> FeatureBoundary {
        FeatureBoundary::new(feature.name(), location, Arc::clone(&self.reporter))
    }
}
