//! League membership and weekly leaderboards.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use super::client::PlatformClient;
use super::dto::{LeaderboardRowDto, LeagueMembershipRowDto};
use super::eq;
use crate::domain::ports::{LeagueRepository, RemoteError};
use crate::domain::{LeaderboardEntry, LeagueTier, UserId};

/// League reads over `league_memberships` and `league_leaderboards`.
pub struct RestLeagueRepository {
    client: Arc<PlatformClient>,
}

impl RestLeagueRepository {
    /// Build the repository over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LeagueRepository for RestLeagueRepository {
    async fn league_tier(&self, user_id: &UserId) -> Result<Option<LeagueTier>, RemoteError> {
        let rows: Vec<LeagueMembershipRowDto> = self
            .client
            .select(
                "league_memberships",
                &[
                    ("select", "tier".to_owned()),
                    ("user_id", eq(user_id)),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(LeagueMembershipRowDto::into_domain_tier)
            .transpose()
            .map_err(RemoteError::malformed)
    }

    async fn leaderboard(
        &self,
        tier: &LeagueTier,
        period_start: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        let rows: Vec<LeaderboardRowDto> = self
            .client
            .select(
                "league_leaderboards",
                &[
                    ("select", "user_id,display_name,weekly_xp".to_owned()),
                    ("tier", eq(tier.as_str())),
                    (
                        "period_start",
                        eq(period_start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ),
                    ("order", "weekly_xp.desc".to_owned()),
                ],
            )
            .await?;
        rows.into_iter()
            .map(LeaderboardRowDto::into_domain_entry)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RemoteError::malformed)
    }
}
