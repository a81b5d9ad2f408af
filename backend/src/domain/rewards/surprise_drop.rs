//! Random surprise drops after quest completion.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::TryFutureExt;
use mockable::Clock;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{RewardGrant, RewardTemplate, RewardType};
use crate::domain::ports::{NotificationSink, RewardRepository};
use crate::domain::{Notification, NotificationKind, RuleConfig, UserId, safe_call};

/// Templates a drop is drawn from, uniformly.
pub static SURPRISE_TEMPLATES: [RewardTemplate; 3] = [
    RewardTemplate {
        reward_type: RewardType::BonusXp,
        title: "Surprise! Bonus XP",
        message: "You found 50 bonus XP. Keep questing!",
    },
    RewardTemplate {
        reward_type: RewardType::StreakShield,
        title: "Surprise! Streak Shield",
        message: "A streak shield will protect you for one missed day.",
    },
    RewardTemplate {
        reward_type: RewardType::XpBoost,
        title: "Surprise! XP Boost",
        message: "Double XP for the next hour.",
    },
];

const TRIGGER: &str = "quest_completed";

/// What a quest completion produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SurpriseOutcome {
    /// The trial failed; no drop this time.
    NoDrop,
    /// A drop of this type was granted recently (or that could not be
    /// ruled out), so nothing was granted.
    Suppressed {
        /// Type drawn by the trial.
        reward_type: RewardType,
    },
    /// A grant was recorded and the user notified.
    Granted(RewardGrant),
    /// Recording the grant failed.
    Unavailable,
}

/// Ports the surprise drop rule drives.
pub struct SurpriseDropPorts {
    /// Grants table access.
    pub repository: Arc<dyn RewardRepository>,
    /// Notification destination.
    pub notifications: Arc<dyn NotificationSink>,
    /// Time source for windows and expiries.
    pub clock: Arc<dyn Clock>,
}

/// Rate-limited random reward rule.
pub struct SurpriseDrops {
    repository: Arc<dyn RewardRepository>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    rng: Mutex<SmallRng>,
    probability: f64,
    window: TimeDelta,
    expiry: TimeDelta,
}

impl SurpriseDrops {
    /// Build the rule with an entropy-seeded random source.
    pub fn new(ports: SurpriseDropPorts, config: &RuleConfig) -> Self {
        Self::with_rng(ports, config, SmallRng::from_entropy())
    }

    /// Build the rule with an explicit random source.
    pub fn with_rng(ports: SurpriseDropPorts, config: &RuleConfig, rng: SmallRng) -> Self {
        Self {
            repository: ports.repository,
            notifications: ports.notifications,
            clock: ports.clock,
            rng: Mutex::new(rng),
            probability: if config.surprise_drop_probability.is_nan() {
                0.0
            } else {
                config.surprise_drop_probability.clamp(0.0, 1.0)
            },
            window: config.surprise_drop_window,
            expiry: config.surprise_drop_expiry,
        }
    }

    /// Run the Bernoulli trial and, on success, draw a template.
    pub fn roll(&self) -> Option<&'static RewardTemplate> {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !rng.gen_bool(self.probability) {
            return None;
        }
        SURPRISE_TEMPLATES.choose(&mut *rng)
    }

    /// Apply the rule to one quest completion.
    pub async fn on_quest_completed(&self, user_id: &UserId) -> SurpriseOutcome {
        let Some(template) = self.roll() else {
            return SurpriseOutcome::NoDrop;
        };
        let reward_type = template.reward_type;
        let now = self.clock.utc();

        let recent = safe_call(
            "recent_surprise_grant",
            self.repository.grant_exists_since(
                user_id,
                reward_type,
                now.checked_sub_signed(self.window)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
            true,
        )
        .await;
        if recent {
            debug!(user_id = %user_id, %reward_type, "surprise drop suppressed");
            return SurpriseOutcome::Suppressed { reward_type };
        }

        let grant = RewardGrant {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            reward_type,
            value: reward_type.default_payload(),
            trigger: TRIGGER.to_owned(),
            created_at: now,
            expires_at: now.checked_add_signed(self.expiry),
        };
        let inserted = safe_call(
            "insert_surprise_grant",
            self.repository.insert_grant(&grant).map_ok(|()| true),
            false,
        )
        .await;
        if !inserted {
            warn!(user_id = %user_id, %reward_type, "surprise drop lost");
            return SurpriseOutcome::Unavailable;
        }

        info!(user_id = %user_id, %reward_type, grant_id = %grant.id, "surprise drop granted");
        self.notifications.notify(Notification::new(
            NotificationKind::Reward,
            template.title,
            template.message,
        ));
        SurpriseOutcome::Granted(grant)
    }
}
