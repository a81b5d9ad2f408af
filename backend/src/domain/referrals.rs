//! Referral code redemption behind the `process-referral` edge function.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::ports::ReferralLedger;
use crate::domain::{Error, UserId};

const MIN_CODE_LEN: usize = 4;
const MAX_CODE_LEN: usize = 32;

/// Validation errors returned by [`ReferralCode::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferralCodeError {
    /// The code was empty or whitespace.
    #[error("referral code must not be empty")]
    Empty,
    /// The code was too short or too long.
    #[error("referral code must be between 4 and 32 characters")]
    Length,
    /// The code contained something other than letters, digits or hyphens.
    #[error("referral code may only contain letters, digits and hyphens")]
    InvalidCharacter,
}

/// Normalised referral code: trimmed and upper-cased.
///
/// # Examples
/// ```
/// use questline::domain::ReferralCode;
///
/// let code = ReferralCode::new("  quest-42 ").expect("valid code");
/// assert_eq!(code.as_str(), "QUEST-42");
/// assert!(ReferralCode::new("no spaces").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Validate and normalise `raw`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ReferralCodeError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ReferralCodeError::Empty);
        }
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&trimmed.chars().count()) {
            return Err(ReferralCodeError::Length);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ReferralCodeError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Borrow the normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a redemption attempt the platform completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferralOutcome {
    /// Both parties were credited.
    Rewarded {
        /// XP credited to the referee.
        xp_awarded: u32,
    },
    /// The platform refused the code.
    Rejected {
        /// Reason given by the platform.
        reason: String,
    },
}

/// Redeems referral codes for authenticated callers.
pub struct ReferralService {
    ledger: Arc<dyn ReferralLedger>,
}

impl ReferralService {
    /// Build the service.
    pub fn new(ledger: Arc<dyn ReferralLedger>) -> Self {
        Self { ledger }
    }

    /// Redeem `raw_code` for `referee`.
    ///
    /// A malformed code is an invalid request; a code the platform refuses
    /// is a conflict carrying the platform's reason.
    pub async fn redeem(&self, referee: &UserId, raw_code: &str) -> Result<u32, Error> {
        let code = ReferralCode::new(raw_code).map_err(|err| Error::invalid_request(err.to_string()))?;
        match self.ledger.process_referral(referee, &code).await? {
            ReferralOutcome::Rewarded { xp_awarded } => {
                info!(referee = %referee, code = %code, xp_awarded, "referral redeemed");
                Ok(xp_awarded)
            }
            ReferralOutcome::Rejected { reason } => {
                info!(referee = %referee, code = %code, %reason, "referral rejected");
                Err(Error::conflict(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockReferralLedger, RemoteError};
    use rstest::rstest;

    #[rstest]
    #[case("abcd", "ABCD")]
    #[case(" Friend-2026 ", "FRIEND-2026")]
    fn valid_codes_are_normalised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ReferralCode::new(raw).expect("valid").as_str(), expected);
    }

    #[rstest]
    #[case(String::new(), ReferralCodeError::Empty)]
    #[case("   ".to_owned(), ReferralCodeError::Empty)]
    #[case("abc".to_owned(), ReferralCodeError::Length)]
    #[case("a".repeat(33), ReferralCodeError::Length)]
    #[case("abc def".to_owned(), ReferralCodeError::InvalidCharacter)]
    #[case("code_1".to_owned(), ReferralCodeError::InvalidCharacter)]
    #[case("ÀBCD".to_owned(), ReferralCodeError::InvalidCharacter)]
    fn invalid_codes_are_rejected(#[case] raw: String, #[case] expected: ReferralCodeError) {
        assert_eq!(ReferralCode::new(raw), Err(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn rewarded_referral_returns_xp() {
        let mut ledger = MockReferralLedger::new();
        ledger
            .expect_process_referral()
            .withf(|_, code| code.as_str() == "QUEST-42")
            .times(1)
            .return_once(|_, _| Ok(ReferralOutcome::Rewarded { xp_awarded: 100 }));
        let service = ReferralService::new(std::sync::Arc::new(ledger));

        let xp = service
            .redeem(&UserId::random(), "quest-42")
            .await
            .expect("redeemed");

        assert_eq!(xp, 100);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_code_never_reaches_the_platform() {
        let mut ledger = MockReferralLedger::new();
        ledger.expect_process_referral().never();
        let service = ReferralService::new(std::sync::Arc::new(ledger));

        let error = service
            .redeem(&UserId::random(), "!!")
            .await
            .expect_err("invalid code");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case(Ok(ReferralOutcome::Rejected { reason: "cannot refer yourself".to_owned() }), ErrorCode::Conflict)]
    #[case(Err(RemoteError::transport("offline")), ErrorCode::ServiceUnavailable)]
    #[tokio::test]
    async fn refusals_and_failures_map_to_error_codes(
        #[case] answer: Result<ReferralOutcome, RemoteError>,
        #[case] code: ErrorCode,
    ) {
        let mut ledger = MockReferralLedger::new();
        ledger
            .expect_process_referral()
            .times(1)
            .return_once(move |_, _| answer);
        let service = ReferralService::new(std::sync::Arc::new(ledger));

        let error = service
            .redeem(&UserId::random(), "ABCD")
            .await
            .expect_err("refused");

        assert_eq!(error.code(), code);
    }
}
