//! Feature flag reads and client error logging.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::client::PlatformClient;
use super::dto::{FeatureFlagRowDto, into_domain_flags};
use crate::domain::ports::{ErrorReporter, FeatureErrorReport, FeatureFlagSource, RemoteError};
use crate::domain::{FeatureFlagSet, UserId};

/// Reads the `feature_flags` table and the rollout procedure.
pub struct RestFeatureFlagSource {
    client: Arc<PlatformClient>,
}

impl RestFeatureFlagSource {
    /// Build the source over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeatureFlagSource for RestFeatureFlagSource {
    async fn fetch_flags(&self) -> Result<FeatureFlagSet, RemoteError> {
        let rows: Vec<FeatureFlagRowDto> = self
            .client
            .select("feature_flags", &[("select", "name,enabled".to_owned())])
            .await?;
        into_domain_flags(rows).map_err(RemoteError::malformed)
    }

    async fn check_rollout(&self, flag: &str, user_id: &UserId) -> Result<bool, RemoteError> {
        self.client
            .rpc(
                "check_feature_rollout",
                &json!({ "flag_name": flag, "user_id": user_id }),
            )
            .await
    }
}

/// Sends isolated feature failures to `log_client_error`.
pub struct RestErrorReporter {
    client: Arc<PlatformClient>,
}

impl RestErrorReporter {
    /// Build the reporter over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ErrorReporter for RestErrorReporter {
    async fn report(&self, report: &FeatureErrorReport) -> Result<(), RemoteError> {
        self.client
            .rpc_void(
                "log_client_error",
                &json!({
                    "feature": report.feature,
                    "message": report.message,
                    "stack": report.stack,
                    "location": report.location,
                }),
            )
            .await
    }
}
