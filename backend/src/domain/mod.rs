//! Business rules of the habit tracker and the ports they drive.
//!
//! Purpose: hold every client-side rule (flag gating, feature isolation,
//! entitlement self-heal, reward heuristics, league lookup) behind traits so
//! adapters can be swapped in tests. Remote failures degrade to inert values
//! through [`safe_call`]; nothing in this module retries.
//!
//! Public surface:
//! - Error / ErrorCode: failure payload shared with the edge functions.
//! - FeatureFlagGate / FeatureBoundary: gating and isolation.
//! - EntitlementReconciler, MilestoneRewards, SurpriseDrops,
//!   LeagueStandings, ProtectionMonitor: the individual rules.
//! - QuestSession: all of the above wired for one user.

pub mod admin_users;
pub mod celebrations;
pub mod entitlement;
pub mod error;
pub mod feature_boundary;
pub mod feature_flag_gate;
pub mod feature_flags;
pub mod league;
pub mod notification;
pub mod ports;
pub mod protection;
pub mod referrals;
pub mod reminders;
pub mod rewards;
pub mod rule_config;
pub mod runtime;
pub mod safe_call;
pub mod session;
pub mod subscription;
pub mod user;

pub use self::admin_users::{ADMIN_ROLE, AdminUserService};
pub use self::celebrations::{
    Celebration, CelebrationTracker, MilestoneCelebrationState, UserProgress,
};
pub use self::entitlement::{
    EntitlementPorts, EntitlementReconciler, ReconcileOutcome, ReconcileStep,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::feature_boundary::{BoundaryState, FeatureBoundary, render_all};
pub use self::feature_flag_gate::FeatureFlagGate;
pub use self::feature_flags::{FeatureFlag, FeatureFlagSet};
pub use self::league::{
    LeaderboardEntry, LeagueStanding, LeagueStandings, LeagueTier, compute_rank,
    scoring_period_start,
};
pub use self::notification::{Notification, NotificationKind};
pub use self::protection::{Protection, ProtectionMonitor, StreakShield, XpBoost};
pub use self::referrals::{ReferralCode, ReferralCodeError, ReferralOutcome, ReferralService};
pub use self::reminders::{
    NotificationThrottle, ReminderBanner, ReminderPolicy, ReminderPorts, ReminderScheduler,
};
pub use self::rewards::{
    MilestoneGrant, MilestoneOutcome, MilestoneRewards, RewardGrant, RewardTemplate, RewardType,
    SURPRISE_TEMPLATES, SurpriseDropPorts, SurpriseDrops, SurpriseOutcome,
    milestone_notification,
};
pub use self::rule_config::{MAX_RULE_WINDOW, RuleConfig, RuleConfigError};
pub use self::runtime::{PollHandle, Sleeper, TokioSleeper, spawn_poller};
pub use self::safe_call::safe_call;
pub use self::session::{QuestRewards, QuestSession, SessionPorts, SessionStart};
pub use self::subscription::{ApprovedPaymentProof, SubscriptionRecord, SubscriptionStatus};
pub use self::user::{UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use questline::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
