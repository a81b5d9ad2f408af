//! Port for the remote reward ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{MilestoneGrant, RewardGrant, RewardType, UserId};

use super::RemoteError;

/// Reward issuance backed by remote procedures and the grants table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// Ask the platform to grant the milestone reward for `streak_count`.
    ///
    /// The procedure performs the "already granted" check atomically and
    /// answers `granted: false` for duplicates.
    async fn grant_streak_reward(
        &self,
        user_id: &UserId,
        streak_count: u32,
    ) -> Result<MilestoneGrant, RemoteError>;

    /// Whether a grant of `reward_type` was issued to the user at or after
    /// `since`.
    async fn grant_exists_since(
        &self,
        user_id: &UserId,
        reward_type: RewardType,
        since: DateTime<Utc>,
    ) -> Result<bool, RemoteError>;

    /// Record a new grant.
    async fn insert_grant(&self, grant: &RewardGrant) -> Result<(), RemoteError>;
}

/// Ledger that never grants and never remembers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRewardRepository;

#[async_trait]
impl RewardRepository for FixtureRewardRepository {
    async fn grant_streak_reward(
        &self,
        _user_id: &UserId,
        _streak_count: u32,
    ) -> Result<MilestoneGrant, RemoteError> {
        Ok(MilestoneGrant { granted: false })
    }

    async fn grant_exists_since(
        &self,
        _user_id: &UserId,
        _reward_type: RewardType,
        _since: DateTime<Utc>,
    ) -> Result<bool, RemoteError> {
        Ok(false)
    }

    async fn insert_grant(&self, _grant: &RewardGrant) -> Result<(), RemoteError> {
        Ok(())
    }
}
