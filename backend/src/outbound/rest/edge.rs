//! Privileged calls made by the edge functions with the service key.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::client::PlatformClient;
use super::dto::ReferralResultDto;
use crate::domain::ports::{AccessTokenVerifier, AdminDirectory, ReferralLedger, RemoteError};
use crate::domain::{ReferralCode, ReferralOutcome, UserId};

/// Resolves bearer tokens through the auth API.
pub struct RestAccessTokenVerifier {
    client: Arc<PlatformClient>,
}

impl RestAccessTokenVerifier {
    /// Build the verifier over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccessTokenVerifier for RestAccessTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, RemoteError> {
        self.client.user_for_token(token).await
    }
}

/// Referral bookkeeping through `process_referral_reward`.
pub struct RestReferralLedger {
    client: Arc<PlatformClient>,
}

impl RestReferralLedger {
    /// Build the ledger over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferralLedger for RestReferralLedger {
    async fn process_referral(
        &self,
        referee: &UserId,
        code: &ReferralCode,
    ) -> Result<ReferralOutcome, RemoteError> {
        let result: ReferralResultDto = self
            .client
            .rpc(
                "process_referral_reward",
                &json!({ "referee_id": referee, "referral_code": code.as_str() }),
            )
            .await?;
        result.into_domain_outcome().map_err(RemoteError::malformed)
    }
}

/// Role checks and account deletion.
pub struct RestAdminDirectory {
    client: Arc<PlatformClient>,
}

impl RestAdminDirectory {
    /// Build the directory over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AdminDirectory for RestAdminDirectory {
    async fn has_role(&self, user_id: &UserId, role: &str) -> Result<bool, RemoteError> {
        self.client
            .rpc("has_role", &json!({ "_user_id": user_id, "_role": role }))
            .await
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<(), RemoteError> {
        self.client.delete_auth_user(user_id).await
    }
}
