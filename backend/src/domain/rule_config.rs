//! Tunable thresholds and timings shared by every rule.

use std::time::Duration;

use chrono::TimeDelta;

/// Validation errors returned by [`RuleConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleConfigError {
    /// No streak milestones were configured.
    #[error("at least one streak milestone is required")]
    NoMilestones,
    /// A milestone of zero days was configured.
    #[error("streak milestones must be positive")]
    ZeroMilestone,
    /// The surprise drop probability fell outside `[0, 1]`.
    #[error("surprise drop probability must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),
    /// A poll interval of zero was configured.
    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),
    /// A time window of zero or less was configured.
    #[error("{0} must be a positive duration")]
    NonPositiveWindow(&'static str),
    /// A time window exceeded [`MAX_RULE_WINDOW`].
    #[error("{0} must not exceed ten years")]
    WindowTooLong(&'static str),
    /// The premium tier name was blank.
    #[error("premium tier name must not be blank")]
    BlankTier,
}

/// Longest window any rule accepts. Keeps date arithmetic far from
/// `DateTime` limits.
pub const MAX_RULE_WINDOW: TimeDelta = TimeDelta::days(3650);

/// Explicit configuration passed into every rule service.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    /// Streak counts that earn a milestone reward. Exact matches only.
    pub streak_milestones: Vec<u32>,
    /// Chance that completing a quest triggers a surprise drop.
    pub surprise_drop_probability: f64,
    /// Window in which a second drop of the same type is suppressed.
    pub surprise_drop_window: TimeDelta,
    /// Lifetime of a surprise drop grant.
    pub surprise_drop_expiry: TimeDelta,
    /// Delay between session start and entitlement reconciliation.
    pub reconcile_delay: Duration,
    /// Paid period written by a repaired subscription.
    pub subscription_period: TimeDelta,
    /// Tier name written by a repaired subscription.
    pub premium_tier: String,
    /// How often protection status is refreshed.
    pub protection_poll_interval: Duration,
    /// How often reminder banners are evaluated.
    pub reminder_poll_interval: Duration,
    /// Minimum gap between two reminders of the same kind.
    pub notification_throttle: TimeDelta,
    /// How close to expiry a subscription triggers the renewal banner.
    pub expiry_warning_window: TimeDelta,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            streak_milestones: vec![7, 10],
            surprise_drop_probability: 0.08,
            surprise_drop_window: TimeDelta::hours(24),
            surprise_drop_expiry: TimeDelta::hours(24),
            reconcile_delay: Duration::from_secs(3),
            subscription_period: TimeDelta::days(30),
            premium_tier: "premium".to_owned(),
            protection_poll_interval: Duration::from_secs(60),
            reminder_poll_interval: Duration::from_secs(3600),
            notification_throttle: TimeDelta::hours(24),
            expiry_warning_window: TimeDelta::days(3),
        }
    }
}

impl RuleConfig {
    /// Check the configuration for values no rule can work with.
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        if self.streak_milestones.is_empty() {
            return Err(RuleConfigError::NoMilestones);
        }
        if self.streak_milestones.contains(&0) {
            return Err(RuleConfigError::ZeroMilestone);
        }
        if !(0.0..=1.0).contains(&self.surprise_drop_probability) {
            return Err(RuleConfigError::ProbabilityOutOfRange(
                self.surprise_drop_probability,
            ));
        }
        if self.protection_poll_interval.is_zero() {
            return Err(RuleConfigError::ZeroInterval("protection poll"));
        }
        if self.reminder_poll_interval.is_zero() {
            return Err(RuleConfigError::ZeroInterval("reminder poll"));
        }
        for (name, window) in [
            ("surprise drop window", self.surprise_drop_window),
            ("surprise drop expiry", self.surprise_drop_expiry),
            ("subscription period", self.subscription_period),
            ("notification throttle", self.notification_throttle),
            ("expiry warning window", self.expiry_warning_window),
        ] {
            if window <= TimeDelta::zero() {
                return Err(RuleConfigError::NonPositiveWindow(name));
            }
            if window > MAX_RULE_WINDOW {
                return Err(RuleConfigError::WindowTooLong(name));
            }
        }
        if self.premium_tier.trim().is_empty() {
            return Err(RuleConfigError::BlankTier);
        }
        Ok(())
    }

    /// Whether `streak_count` is exactly one of the configured milestones.
    pub fn is_milestone(&self, streak_count: u32) -> bool {
        self.streak_milestones.contains(&streak_count)
    }
}
