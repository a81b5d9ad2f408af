//! Port for the privileged referral reward procedure.

use async_trait::async_trait;

use crate::domain::{ReferralCode, ReferralOutcome, UserId};

use super::RemoteError;

/// Referral bookkeeping owned by the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferralLedger: Send + Sync {
    /// Credit the referral identified by `code` to `referee`.
    ///
    /// The procedure rejects self-referrals, unknown codes and repeat
    /// redemptions and reports the reason in [`ReferralOutcome::Rejected`].
    async fn process_referral(
        &self,
        referee: &UserId,
        code: &ReferralCode,
    ) -> Result<ReferralOutcome, RemoteError>;
}

/// Ledger rejecting every code.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReferralLedger;

#[async_trait]
impl ReferralLedger for FixtureReferralLedger {
    async fn process_referral(
        &self,
        _referee: &UserId,
        _code: &ReferralCode,
    ) -> Result<ReferralOutcome, RemoteError> {
        Ok(ReferralOutcome::Rejected {
            reason: "referral code not found".to_owned(),
        })
    }
}
