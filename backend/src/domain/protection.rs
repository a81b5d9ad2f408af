//! Power-up protection status: streak shields and XP boosts.
//!
//! Protection is derived client-side from the active power-up rows and
//! refreshed on a fixed interval while the status is on screen.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::TryFutureExt;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::ProtectionRepository;
use crate::domain::{PollHandle, RuleConfig, UserId, safe_call, spawn_poller};

/// An active streak shield row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakShield {
    /// When the shield stops protecting the streak.
    pub expires_at: DateTime<Utc>,
}

/// An active XP multiplier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpBoost {
    /// XP multiplier, e.g. `2.0` for double XP.
    pub multiplier: f64,
    /// When the boost ends.
    pub expires_at: DateTime<Utc>,
}

/// Protection currently applied to a user's progression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Protection {
    /// Whole or partial days of shield left; zero when unshielded.
    pub shield_days_remaining: u32,
    /// Boost still running, if any.
    pub xp_boost: Option<XpBoost>,
}

impl Protection {
    /// Derive protection from the active rows as of `now`.
    ///
    /// Rows that have already expired contribute nothing. Partial days of
    /// shield round up.
    pub fn derive(
        shield: Option<&StreakShield>,
        boost: Option<&XpBoost>,
        now: DateTime<Utc>,
    ) -> Self {
        let shield_days_remaining = shield
            .map(|shield| shield.expires_at - now)
            .filter(|left| *left > TimeDelta::zero())
            .map_or(0, days_rounded_up);
        let xp_boost = boost.filter(|boost| boost.expires_at > now).cloned();
        Self {
            shield_days_remaining,
            xp_boost,
        }
    }

    /// Whether any power-up is active.
    pub fn is_active(&self) -> bool {
        self.shield_days_remaining > 0 || self.xp_boost.is_some()
    }
}

/// Whole days in `left`, counting any partial day as a full one.
pub(crate) fn days_rounded_up(left: TimeDelta) -> u32 {
    let whole = left.num_days();
    let days = whole + i64::from(left > TimeDelta::days(whole));
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Reads and periodically refreshes a user's protection.
pub struct ProtectionMonitor {
    repository: Arc<dyn ProtectionRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ProtectionMonitor {
    /// Build the monitor with the configured poll interval.
    pub fn new(
        repository: Arc<dyn ProtectionRepository>,
        clock: Arc<dyn Clock>,
        config: &RuleConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            interval: config.protection_poll_interval,
        }
    }

    /// Fetch shield and boost concurrently and derive protection.
    ///
    /// `None` when either read fails.
    pub async fn refresh(&self, user_id: &UserId) -> Option<Protection> {
        let (shield, boost) = tokio::join!(
            safe_call(
                "load_streak_shield",
                self.repository.active_shield(user_id).map_ok(Some),
                None,
            ),
            safe_call(
                "load_xp_boost",
                self.repository.active_xp_boost(user_id).map_ok(Some),
                None,
            ),
        );
        let protection = Protection::derive(shield?.as_ref(), boost?.as_ref(), self.clock.utc());
        debug!(user_id = %user_id, ?protection, "protection refreshed");
        Some(protection)
    }

    /// Publish fresh protection every poll interval until the handle drops.
    pub fn watch(
        self: &Arc<Self>,
        user_id: UserId,
    ) -> (watch::Receiver<Option<Protection>>, PollHandle) {
        let (sender, receiver) = watch::channel(None);
        let sender = Arc::new(sender);
        let monitor = Arc::clone(self);
        let handle = spawn_poller(self.interval, move || {
            let monitor = Arc::clone(&monitor);
            let sender = Arc::clone(&sender);
            let user_id = user_id.clone();
            async move {
                let protection = monitor.refresh(&user_id).await;
                sender.send_replace(protection);
            }
        });
        (receiver, handle)
    }
}
