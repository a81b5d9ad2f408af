//! Exact-match streak milestone rewards.

use std::sync::Arc;

use futures_util::TryFutureExt;
use tracing::{debug, info};

use crate::domain::ports::{NotificationSink, RewardRepository};
use crate::domain::{Notification, NotificationKind, RuleConfig, UserId, safe_call};

/// What a streak update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneOutcome {
    /// The streak count is not a milestone; the platform was not called.
    NotMilestone,
    /// The platform granted the reward and the user was notified.
    Granted,
    /// The platform had already granted this milestone.
    AlreadyGranted,
    /// The grant procedure failed; nothing was shown.
    Unavailable,
}

/// Notification shown when `streak_count` earns its reward.
pub fn milestone_notification(streak_count: u32) -> Notification {
    let message = match streak_count {
        7 => "A full week of quests! Your streak reward has been added.".to_owned(),
        10 => "Ten days without a miss! Your streak reward has been added.".to_owned(),
        n => format!("{n} days in a row! Your streak reward has been added."),
    };
    Notification::new(
        NotificationKind::Reward,
        format!("{streak_count}-Day Streak Reward"),
        message,
    )
}

/// Milestone rule over the platform's grant procedure.
pub struct MilestoneRewards {
    repository: Arc<dyn RewardRepository>,
    notifications: Arc<dyn NotificationSink>,
    milestones: Vec<u32>,
}

impl MilestoneRewards {
    /// Build the rule with the configured milestones.
    pub fn new(
        repository: Arc<dyn RewardRepository>,
        notifications: Arc<dyn NotificationSink>,
        config: &RuleConfig,
    ) -> Self {
        Self {
            repository,
            notifications,
            milestones: config.streak_milestones.clone(),
        }
    }

    /// Apply the rule to a new streak count.
    pub async fn on_streak_updated(&self, user_id: &UserId, streak_count: u32) -> MilestoneOutcome {
        if !self.milestones.contains(&streak_count) {
            return MilestoneOutcome::NotMilestone;
        }
        let grant = safe_call(
            "grant_streak_reward",
            self.repository
                .grant_streak_reward(user_id, streak_count)
                .map_ok(Some),
            None,
        )
        .await;
        match grant {
            Some(grant) if grant.granted => {
                info!(user_id = %user_id, streak_count, "streak milestone rewarded");
                self.notifications
                    .notify(milestone_notification(streak_count));
                MilestoneOutcome::Granted
            }
            Some(_) => {
                debug!(user_id = %user_id, streak_count, "streak milestone already rewarded");
                MilestoneOutcome::AlreadyGranted
            }
            None => MilestoneOutcome::Unavailable,
        }
    }
}
