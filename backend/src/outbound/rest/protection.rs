//! Active streak shields and XP boosts.

use std::sync::Arc;

use async_trait::async_trait;

use super::client::PlatformClient;
use super::dto::{StreakShieldRowDto, XpBoostRowDto};
use super::eq;
use crate::domain::ports::{ProtectionRepository, RemoteError};
use crate::domain::{StreakShield, UserId, XpBoost};

/// Power-up reads over `streak_shields` and `xp_boosts`.
pub struct RestProtectionRepository {
    client: Arc<PlatformClient>,
}

impl RestProtectionRepository {
    /// Build the repository over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }

    fn active_row_query(user_id: &UserId, columns: &str) -> [(&'static str, String); 5] {
        [
            ("select", columns.to_owned()),
            ("user_id", eq(user_id)),
            ("is_active", eq(true)),
            ("order", "expires_at.desc".to_owned()),
            ("limit", "1".to_owned()),
        ]
    }
}

#[async_trait]
impl ProtectionRepository for RestProtectionRepository {
    async fn active_shield(&self, user_id: &UserId) -> Result<Option<StreakShield>, RemoteError> {
        let rows: Vec<StreakShieldRowDto> = self
            .client
            .select(
                "streak_shields",
                &Self::active_row_query(user_id, "expires_at"),
            )
            .await?;
        Ok(rows.into_iter().next().map(StreakShield::from))
    }

    async fn active_xp_boost(&self, user_id: &UserId) -> Result<Option<XpBoost>, RemoteError> {
        let rows: Vec<XpBoostRowDto> = self
            .client
            .select(
                "xp_boosts",
                &Self::active_row_query(user_id, "multiplier,expires_at"),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(XpBoostRowDto::into_domain_boost)
            .transpose()
            .map_err(RemoteError::malformed)
    }
}
