//! Payment proofs, premium flag, subscriptions and session refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::client::PlatformClient;
use super::dto::{
    PaymentProofRowDto, ProfileRowDto, SubscriptionRowDto, SubscriptionStatusRowDto,
};
use super::eq;
use crate::domain::ports::{AuthSession, EntitlementRepository, RemoteError};
use crate::domain::{ApprovedPaymentProof, SubscriptionRecord, SubscriptionStatus, UserId};

/// Entitlement state in the `payment_proofs`, `profiles` and
/// `subscriptions` tables.
pub struct RestEntitlementRepository {
    client: Arc<PlatformClient>,
}

impl RestEntitlementRepository {
    /// Build the repository over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntitlementRepository for RestEntitlementRepository {
    async fn latest_approved_payment_proof(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ApprovedPaymentProof>, RemoteError> {
        let rows: Vec<PaymentProofRowDto> = self
            .client
            .select(
                "payment_proofs",
                &[
                    ("select", "id,user_id,submitted_at".to_owned()),
                    ("user_id", eq(user_id)),
                    ("status", eq("approved")),
                    ("order", "submitted_at.desc".to_owned()),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(PaymentProofRowDto::into_domain_proof)
            .transpose()
            .map_err(RemoteError::malformed)
    }

    async fn premium_status(&self, user_id: &UserId) -> Result<bool, RemoteError> {
        let rows: Vec<ProfileRowDto> = self
            .client
            .select(
                "profiles",
                &[
                    ("select", "is_premium".to_owned()),
                    ("id", eq(user_id)),
                ],
            )
            .await?;
        let profile = rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::not_found(format!("profile {user_id}")))?;
        Ok(profile.is_premium.unwrap_or(false))
    }

    async fn set_premium_status(
        &self,
        user_id: &UserId,
        premium: bool,
    ) -> Result<(), RemoteError> {
        self.client
            .rpc_void(
                "set_premium_status",
                &json!({ "target_user_id": user_id, "is_premium": premium }),
            )
            .await
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), RemoteError> {
        self.client
            .upsert("subscriptions", &SubscriptionRowDto::from(record), "user_id")
            .await
    }

    async fn subscription_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionStatus>, RemoteError> {
        let rows: Vec<SubscriptionStatusRowDto> = self
            .client
            .select(
                "subscriptions",
                &[
                    ("select", "tier,is_active,expires_at".to_owned()),
                    ("user_id", eq(user_id)),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(SubscriptionStatusRowDto::into_domain_status)
            .transpose()
            .map_err(RemoteError::malformed)
    }
}

/// Refreshes the signed-in user's session tokens.
pub struct RestAuthSession {
    client: Arc<PlatformClient>,
}

impl RestAuthSession {
    /// Build the session handle over a shared client.
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthSession for RestAuthSession {
    async fn refresh_session(&self) -> Result<(), RemoteError> {
        self.client.refresh_session().await
    }
}
