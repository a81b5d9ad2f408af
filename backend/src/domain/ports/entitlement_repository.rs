//! Ports for payment, premium and subscription state, plus the session
//! refresh the reconciler needs after a repair.

use async_trait::async_trait;

use crate::domain::{ApprovedPaymentProof, SubscriptionRecord, SubscriptionStatus, UserId};

use super::RemoteError;

/// Remote entitlement state for one user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Most recent approved payment proof, if any.
    async fn latest_approved_payment_proof(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ApprovedPaymentProof>, RemoteError>;

    /// Premium flag on the user's profile.
    async fn premium_status(&self, user_id: &UserId) -> Result<bool, RemoteError>;

    /// Invoke the privileged remote procedure that sets the premium flag.
    async fn set_premium_status(&self, user_id: &UserId, premium: bool)
    -> Result<(), RemoteError>;

    /// Insert or replace the subscription row keyed by user id.
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), RemoteError>;

    /// Current subscription, if the user ever had one.
    async fn subscription_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionStatus>, RemoteError>;
}

/// Authorization context of the signed-in session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Re-issue the session token so row-level checks see fresh claims.
    async fn refresh_session(&self) -> Result<(), RemoteError>;
}

/// Fixture repository for a user with no payments and no subscription.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEntitlementRepository;

#[async_trait]
impl EntitlementRepository for FixtureEntitlementRepository {
    async fn latest_approved_payment_proof(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<ApprovedPaymentProof>, RemoteError> {
        Ok(None)
    }

    async fn premium_status(&self, _user_id: &UserId) -> Result<bool, RemoteError> {
        Ok(false)
    }

    async fn set_premium_status(
        &self,
        _user_id: &UserId,
        _premium: bool,
    ) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn upsert_subscription(&self, _record: &SubscriptionRecord) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn subscription_status(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<SubscriptionStatus>, RemoteError> {
        Ok(None)
    }
}

/// Session whose refresh always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthSession;

#[async_trait]
impl AuthSession for FixtureAuthSession {
    async fn refresh_session(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}
