//! Payment and subscription records read by the entitlement rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// A payment proof a reviewer approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedPaymentProof {
    /// Platform identifier of the proof row.
    pub id: Uuid,
    /// Owner of the proof.
    pub user_id: UserId,
    /// When the proof was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Current subscription state for reminder decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    /// Subscription tier name, e.g. `premium`.
    pub tier: String,
    /// Whether the subscription is active.
    pub active: bool,
    /// End of the paid period, if one is recorded.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Subscription row written during entitlement self-heal.
///
/// Upserts are keyed by `user_id`, so writing the same record twice leaves a
/// single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owner of the subscription.
    pub user_id: UserId,
    /// Subscription tier name.
    pub tier: String,
    /// Whether the subscription is active.
    pub active: bool,
    /// End of the paid period.
    pub expires_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Read-side view of this record.
    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus {
            tier: self.tier.clone(),
            active: self.active,
            expires_at: Some(self.expires_at),
        }
    }
}
