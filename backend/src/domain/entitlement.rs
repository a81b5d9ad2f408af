//! Entitlement self-heal.
//!
//! A reviewer can approve a payment proof without the premium flag ever being
//! set, for example when the approving call timed out half way. Shortly after
//! session start the reconciler looks for that mismatch and repairs it: set
//! the premium flag, upsert the subscription row, refresh the session so
//! row-level checks see the new claims. Every step is idempotent, so the
//! retry policy is simply "run again next session".

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::ports::{AuthSession, EntitlementRepository, NotificationSink, RemoteError};
use crate::domain::{
    Notification, NotificationKind, RuleConfig, Sleeper, SubscriptionRecord, UserId,
};

/// Step of the reconciliation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    /// Reading the latest approved payment proof.
    LoadPaymentProof,
    /// Reading the profile's premium flag.
    LoadPremiumStatus,
    /// Computing the end of the repaired paid period.
    ComputeExpiry,
    /// Calling the privileged premium-status procedure.
    SetPremiumStatus,
    /// Writing the subscription row.
    UpsertSubscription,
    /// Refreshing the session's authorization context.
    RefreshSession,
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadPaymentProof => "load_payment_proof",
            Self::LoadPremiumStatus => "load_premium_status",
            Self::ComputeExpiry => "compute_expiry",
            Self::SetPremiumStatus => "set_premium_status",
            Self::UpsertSubscription => "upsert_subscription",
            Self::RefreshSession => "refresh_session",
        })
    }
}

/// Result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The user has no approved payment; nothing to repair.
    NoApprovedProof,
    /// Payment and premium flag agree.
    AlreadyPremium,
    /// The mismatch was repaired.
    Repaired {
        /// End of the paid period written to the subscription row.
        expires_at: DateTime<Utc>,
    },
    /// A step failed; the user was notified once.
    Failed {
        /// The step that failed.
        step: ReconcileStep,
    },
}

#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    Remote(RemoteError),
    #[error("paid period of {0} overflows the calendar")]
    ExpiryOverflow(TimeDelta),
}

fn at(step: ReconcileStep) -> impl FnOnce(RemoteError) -> (ReconcileStep, StepError) {
    move |err| (step, StepError::Remote(err))
}

/// Ports the reconciler drives.
pub struct EntitlementPorts {
    /// Payment, premium and subscription state.
    pub repository: Arc<dyn EntitlementRepository>,
    /// Session refresh after a repair.
    pub session: Arc<dyn AuthSession>,
    /// Where the single failure notification goes.
    pub notifications: Arc<dyn NotificationSink>,
}

/// Detects and repairs "paid but not premium" accounts.
pub struct EntitlementReconciler {
    repository: Arc<dyn EntitlementRepository>,
    session: Arc<dyn AuthSession>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    tier: String,
    subscription_period: TimeDelta,
    delay: std::time::Duration,
}

impl EntitlementReconciler {
    /// Build a reconciler from its ports and the rule configuration.
    pub fn new(
        ports: EntitlementPorts,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        config: &RuleConfig,
    ) -> Self {
        Self {
            repository: ports.repository,
            session: ports.session,
            notifications: ports.notifications,
            clock,
            sleeper,
            tier: config.premium_tier.clone(),
            subscription_period: config.subscription_period,
            delay: config.reconcile_delay,
        }
    }

    /// Run [`Self::reconcile`] once in the background after the configured
    /// delay, leaving session start unblocked.
    pub fn schedule(self: &Arc<Self>, user_id: UserId) -> JoinHandle<ReconcileOutcome> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            reconciler.sleeper.sleep(reconciler.delay).await;
            reconciler.reconcile(&user_id).await
        })
    }

    /// Compare payment and premium state and repair a mismatch.
    pub async fn reconcile(&self, user_id: &UserId) -> ReconcileOutcome {
        match self.run(user_id).await {
            Ok(outcome) => outcome,
            Err((step, err)) => {
                error!(
                    user_id = %user_id,
                    step = %step,
                    error = %err,
                    "entitlement reconciliation failed"
                );
                self.notifications.notify(Notification::new(
                    NotificationKind::Error,
                    "Premium activation incomplete",
                    "We could not finish activating premium. We will try again next time you open the app.",
                ));
                ReconcileOutcome::Failed { step }
            }
        }
    }

    async fn run(&self, user_id: &UserId) -> Result<ReconcileOutcome, (ReconcileStep, StepError)> {
        let proof = self
            .repository
            .latest_approved_payment_proof(user_id)
            .await
            .map_err(at(ReconcileStep::LoadPaymentProof))?;
        let Some(proof) = proof else {
            debug!(user_id = %user_id, "no approved payment proof");
            return Ok(ReconcileOutcome::NoApprovedProof);
        };

        let premium = self
            .repository
            .premium_status(user_id)
            .await
            .map_err(at(ReconcileStep::LoadPremiumStatus))?;
        if premium {
            return Ok(ReconcileOutcome::AlreadyPremium);
        }

        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(self.subscription_period)
            .ok_or((
                ReconcileStep::ComputeExpiry,
                StepError::ExpiryOverflow(self.subscription_period),
            ))?;

        info!(user_id = %user_id, proof_id = %proof.id, "approved payment without premium; repairing");
        self.repository
            .set_premium_status(user_id, true)
            .await
            .map_err(at(ReconcileStep::SetPremiumStatus))?;

        let record = SubscriptionRecord {
            user_id: user_id.clone(),
            tier: self.tier.clone(),
            active: true,
            expires_at,
        };
        self.repository
            .upsert_subscription(&record)
            .await
            .map_err(at(ReconcileStep::UpsertSubscription))?;

        self.session
            .refresh_session()
            .await
            .map_err(at(ReconcileStep::RefreshSession))?;

        info!(user_id = %user_id, %expires_at, "premium entitlement repaired");
        Ok(ReconcileOutcome::Repaired { expires_at })
    }
}

#[cfg(test)]
#[path = "entitlement_tests.rs"]
mod tests;
