//! Subscription reminder banners and per-device notification throttling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::TryFutureExt;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    EntitlementRepository, KeyValueStore, KeyValueStoreError, NotificationSink,
};
use crate::domain::{
    Notification, NotificationKind, PollHandle, RuleConfig, SubscriptionStatus, UserId, safe_call,
    spawn_poller,
};
use crate::domain::protection::days_rounded_up;

/// Banner shown about the user's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderBanner {
    /// An active subscription ends soon.
    Expiring {
        /// Days left, rounded up.
        days_left: u32,
    },
    /// The subscription has lapsed.
    Expired,
}

impl ReminderBanner {
    /// Throttle key for this banner kind.
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Expiring { .. } => "subscription_expiring",
            Self::Expired => "subscription_expired",
        }
    }

    /// Notification presenting the banner.
    pub fn notification(self) -> Notification {
        match self {
            Self::Expiring { days_left: 1 } => Notification::new(
                NotificationKind::Reminder,
                "Premium ends tomorrow",
                "Renew now to keep your power-ups and leagues.",
            ),
            Self::Expiring { days_left } => Notification::new(
                NotificationKind::Reminder,
                format!("Premium ends in {days_left} days"),
                "Renew now to keep your power-ups and leagues.",
            ),
            Self::Expired => Notification::new(
                NotificationKind::Reminder,
                "Premium has expired",
                "Renew to get your premium features back.",
            ),
        }
    }
}

/// Decides which subscription banner, if any, applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    warning_window: TimeDelta,
}

impl ReminderPolicy {
    /// Warn when fewer than `warning_window` remain.
    pub const fn new(warning_window: TimeDelta) -> Self {
        Self { warning_window }
    }

    /// Banner for `status` at `now`.
    ///
    /// A passed expiry is `Expired` whether or not the row was deactivated
    /// yet; an inactive row with a future expiry shows nothing.
    pub fn banner_for(&self, status: &SubscriptionStatus, now: DateTime<Utc>) -> Option<ReminderBanner> {
        let expires_at = status.expires_at?;
        if expires_at <= now {
            return Some(ReminderBanner::Expired);
        }
        if !status.active {
            return None;
        }
        let left = expires_at - now;
        if left > self.warning_window {
            return None;
        }
        Some(ReminderBanner::Expiring {
            days_left: days_rounded_up(left),
        })
    }
}

/// Allows a notification kind at most once per interval per user and device.
pub struct NotificationThrottle {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    interval: TimeDelta,
}

impl NotificationThrottle {
    /// Build a throttle over the device store.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, interval: TimeDelta) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Whether `kind` may be shown to `user_id` now. Records the showing when
    /// allowed.
    ///
    /// Storage failures deny the notification.
    pub fn allow(&self, user_id: &UserId, kind: &str) -> bool {
        match self.try_allow(user_id, kind) {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(user_id = %user_id, kind, error = %err, "notification throttle unavailable");
                false
            }
        }
    }

    fn try_allow(&self, user_id: &UserId, kind: &str) -> Result<bool, KeyValueStoreError> {
        let key = format!("notification_throttle:{kind}:{user_id}");
        let now = self.clock.utc();
        if let Some(raw) = self.store.get(&key)? {
            let last = DateTime::parse_from_rfc3339(&raw)
                .map_err(|err| KeyValueStoreError::corrupt(key.as_str(), err.to_string()))?
                .with_timezone(&Utc);
            if now - last < self.interval {
                return Ok(false);
            }
        }
        self.store.set(&key, &now.to_rfc3339())?;
        Ok(true)
    }
}

/// Collaborators of the reminder scheduler.
pub struct ReminderPorts {
    /// Subscription reads.
    pub subscriptions: Arc<dyn EntitlementRepository>,
    /// Device store for throttle markers.
    pub store: Arc<dyn KeyValueStore>,
    /// Banner destination.
    pub notifications: Arc<dyn NotificationSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Periodically evaluates subscription banners.
pub struct ReminderScheduler {
    subscriptions: Arc<dyn EntitlementRepository>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
    throttle: NotificationThrottle,
    interval: Duration,
}

impl ReminderScheduler {
    /// Build the scheduler from the rule configuration.
    pub fn new(ports: ReminderPorts, config: &RuleConfig) -> Self {
        Self {
            subscriptions: ports.subscriptions,
            notifications: ports.notifications,
            throttle: NotificationThrottle::new(
                ports.store,
                Arc::clone(&ports.clock),
                config.notification_throttle,
            ),
            clock: ports.clock,
            policy: ReminderPolicy::new(config.expiry_warning_window),
            interval: config.reminder_poll_interval,
        }
    }

    /// Evaluate once; returns the banner that was shown, if any.
    pub async fn check(&self, user_id: &UserId) -> Option<ReminderBanner> {
        let status = safe_call(
            "load_subscription_status",
            self.subscriptions
                .subscription_status(user_id)
                .map_ok(Some),
            None,
        )
        .await??;
        let banner = self.policy.banner_for(&status, self.clock.utc())?;
        if !self.throttle.allow(user_id, banner.kind()) {
            debug!(user_id = %user_id, kind = banner.kind(), "reminder throttled");
            return None;
        }
        self.notifications.notify(banner.notification());
        Some(banner)
    }

    /// Check every poll interval until the handle drops.
    pub fn watch(self: &Arc<Self>, user_id: UserId) -> PollHandle {
        let scheduler = Arc::clone(self);
        spawn_poller(self.interval, move || {
            let scheduler = Arc::clone(&scheduler);
            let user_id = user_id.clone();
            async move {
                scheduler.check(&user_id).await;
            }
        })
    }
}
