//! Port for reading feature flags and server-side rollout decisions.

use async_trait::async_trait;

use crate::domain::{FeatureFlagSet, UserId};

use super::RemoteError;

/// Source of feature flag state.
///
/// The bulk read backs optimistic rendering; the per-flag rollout check is the
/// authoritative gate because the platform owns rollout percentages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeatureFlagSource: Send + Sync {
    /// Fetch every flag the platform publishes.
    async fn fetch_flags(&self) -> Result<FeatureFlagSet, RemoteError>;

    /// Ask the platform whether `flag` is rolled out to `user_id`.
    async fn check_rollout(&self, flag: &str, user_id: &UserId) -> Result<bool, RemoteError>;
}

/// Fixture source publishing a fixed flag set and answering rollouts from it.
#[derive(Debug, Clone, Default)]
pub struct FixtureFeatureFlagSource {
    flags: FeatureFlagSet,
}

impl FixtureFeatureFlagSource {
    /// Serve `flags` for both bulk reads and rollout checks.
    pub fn new(flags: FeatureFlagSet) -> Self {
        Self { flags }
    }
}

#[async_trait]
impl FeatureFlagSource for FixtureFeatureFlagSource {
    async fn fetch_flags(&self) -> Result<FeatureFlagSet, RemoteError> {
        Ok(self.flags.clone())
    }

    async fn check_rollout(&self, flag: &str, _user_id: &UserId) -> Result<bool, RemoteError> {
        Ok(self.flags.is_enabled(flag))
    }
}
