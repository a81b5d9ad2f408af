//! Port for power-up rows: streak shields and XP boosts.

use async_trait::async_trait;

use crate::domain::{StreakShield, UserId, XpBoost};

use super::RemoteError;

/// Active power-ups for a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProtectionRepository: Send + Sync {
    /// Latest-expiring active streak shield.
    async fn active_shield(&self, user_id: &UserId) -> Result<Option<StreakShield>, RemoteError>;

    /// Latest-expiring active XP boost.
    async fn active_xp_boost(&self, user_id: &UserId) -> Result<Option<XpBoost>, RemoteError>;
}
