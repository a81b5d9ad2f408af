//! Reward grants: the streak procedure and the `reward_grants` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::IgnoredAny;
use serde_json::json;

use super::client::PlatformClient;
use super::dto::{MilestoneGrantDto, RewardGrantRowDto};
use super::eq;
use crate::domain::ports::{RemoteError, RewardRepository};
use crate::domain::{MilestoneGrant, RewardGrant, RewardType, UserId};

/// Reward ledger backed by the platform.
pub struct RestRewardRepository {
    client: Arc<PlatformClient>,
}

impl RestRewardRepository {
    /// Build the repository over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RewardRepository for RestRewardRepository {
    async fn grant_streak_reward(
        &self,
        user_id: &UserId,
        streak_count: u32,
    ) -> Result<MilestoneGrant, RemoteError> {
        let answer: MilestoneGrantDto = self
            .client
            .rpc(
                "grant_streak_reward",
                &json!({ "user_id": user_id, "streak_count": streak_count }),
            )
            .await?;
        Ok(MilestoneGrant {
            granted: answer.granted,
        })
    }

    async fn grant_exists_since(
        &self,
        user_id: &UserId,
        reward_type: RewardType,
        since: DateTime<Utc>,
    ) -> Result<bool, RemoteError> {
        let rows: Vec<IgnoredAny> = self
            .client
            .select(
                "reward_grants",
                &[
                    ("select", "id".to_owned()),
                    ("user_id", eq(user_id)),
                    ("reward_type", eq(reward_type)),
                    (
                        "created_at",
                        format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_grant(&self, grant: &RewardGrant) -> Result<(), RemoteError> {
        self.client
            .insert("reward_grants", &RewardGrantRowDto::from(grant))
            .await
    }
}
