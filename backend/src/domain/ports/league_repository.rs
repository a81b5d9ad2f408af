//! Port for league membership and precomputed leaderboards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{LeaderboardEntry, LeagueTier, UserId};

use super::RemoteError;

/// League data owned by the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueRepository: Send + Sync {
    /// Tier the user currently competes in, if any.
    async fn league_tier(&self, user_id: &UserId) -> Result<Option<LeagueTier>, RemoteError>;

    /// Leaderboard for `tier` in the period starting at `period_start`,
    /// already ordered best-first by the platform.
    async fn leaderboard(
        &self,
        tier: &LeagueTier,
        period_start: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, RemoteError>;
}
