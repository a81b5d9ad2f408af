//! Streak milestone rewards and random surprise drops.
//!
//! Both rules run after a quest completion. Milestone rewards fire only on
//! exact streak counts and leave duplicate detection to the platform's grant
//! procedure. Surprise drops are a Bernoulli trial followed by a time-windowed
//! duplicate check against the grants table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::UserId;

mod milestone;
mod surprise_drop;

pub use milestone::{MilestoneOutcome, MilestoneRewards, milestone_notification};
pub use surprise_drop::{SURPRISE_TEMPLATES, SurpriseDropPorts, SurpriseDrops, SurpriseOutcome};

/// Kind of reward recorded in the grants table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// Flat XP bonus.
    BonusXp,
    /// One day of streak protection.
    StreakShield,
    /// Temporary XP multiplier.
    XpBoost,
    /// Reward for reaching a streak milestone.
    StreakMilestone,
}

impl RewardType {
    /// Column value used by the platform.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BonusXp => "bonus_xp",
            Self::StreakShield => "streak_shield",
            Self::XpBoost => "xp_boost",
            Self::StreakMilestone => "streak_milestone",
        }
    }

    /// Payload stored alongside a grant of this type.
    pub fn default_payload(self) -> Value {
        match self {
            Self::BonusXp => json!({ "xp": 50 }),
            Self::StreakShield => json!({ "days": 1 }),
            Self::XpBoost => json!({ "multiplier": 2, "duration_minutes": 60 }),
            Self::StreakMilestone => json!({}),
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed presentation of a surprise drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardTemplate {
    /// Kind of grant the template produces.
    pub reward_type: RewardType,
    /// Notification headline.
    pub title: &'static str,
    /// Notification body.
    pub message: &'static str,
}

/// A row in the grants table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardGrant {
    /// Grant identifier.
    pub id: Uuid,
    /// Recipient.
    pub user_id: UserId,
    /// Kind of reward.
    pub reward_type: RewardType,
    /// Reward parameters, e.g. XP amount or multiplier.
    pub value: Value,
    /// Event that triggered the grant.
    pub trigger: String,
    /// When the grant was issued.
    pub created_at: DateTime<Utc>,
    /// When the grant stops being claimable.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Answer of the platform's streak reward procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneGrant {
    /// `false` when this milestone was already rewarded.
    pub granted: bool,
}

#[cfg(test)]
mod tests;
