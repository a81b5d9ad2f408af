//! Row and payload DTOs for the platform API.
//!
//! Every remote payload is decoded into one of these first and then checked
//! and mapped into domain values in one pass. A row that fails the checks
//! becomes a `Malformed` error instead of leaking half-valid data inward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    ApprovedPaymentProof, FeatureFlagSet, LeaderboardEntry, LeagueTier, ReferralOutcome,
    RewardGrant, StreakShield, SubscriptionRecord, SubscriptionStatus, UserId, XpBoost,
};

fn parse_user_id(raw: &str, context: &str) -> Result<UserId, String> {
    UserId::new(raw).map_err(|error| format!("{context} has invalid user id {raw:?}: {error}"))
}

#[derive(Debug, Deserialize)]
pub(super) struct FeatureFlagRowDto {
    pub(super) name: String,
    pub(super) enabled: bool,
}

pub(super) fn into_domain_flags(rows: Vec<FeatureFlagRowDto>) -> Result<FeatureFlagSet, String> {
    if let Some(row) = rows.iter().find(|row| row.name.trim().is_empty()) {
        return Err(format!("feature flag row with blank name (enabled={})", row.enabled));
    }
    Ok(FeatureFlagSet::from_pairs(
        rows.into_iter().map(|row| (row.name, row.enabled)),
    ))
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentProofRowDto {
    pub(super) id: Uuid,
    pub(super) user_id: String,
    pub(super) submitted_at: DateTime<Utc>,
}

impl PaymentProofRowDto {
    pub(super) fn into_domain_proof(self) -> Result<ApprovedPaymentProof, String> {
        Ok(ApprovedPaymentProof {
            id: self.id,
            user_id: parse_user_id(&self.user_id, "payment proof")?,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileRowDto {
    #[serde(default)]
    pub(super) is_premium: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscriptionRowDto<'a> {
    pub(super) user_id: &'a str,
    pub(super) tier: &'a str,
    pub(super) is_active: bool,
    pub(super) expires_at: DateTime<Utc>,
}

impl<'a> From<&'a SubscriptionRecord> for SubscriptionRowDto<'a> {
    fn from(record: &'a SubscriptionRecord) -> Self {
        Self {
            user_id: record.user_id.as_ref(),
            tier: &record.tier,
            is_active: record.active,
            expires_at: record.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SubscriptionStatusRowDto {
    pub(super) tier: String,
    pub(super) is_active: bool,
    pub(super) expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionStatusRowDto {
    pub(super) fn into_domain_status(self) -> Result<SubscriptionStatus, String> {
        if self.tier.trim().is_empty() {
            return Err("subscription row has a blank tier".to_owned());
        }
        if self.is_active && self.expires_at.is_none() {
            return Err("active subscription row has no expiry".to_owned());
        }
        Ok(SubscriptionStatus {
            tier: self.tier,
            active: self.is_active,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RewardGrantRowDto<'a> {
    pub(super) id: Uuid,
    pub(super) user_id: &'a str,
    pub(super) reward_type: &'static str,
    pub(super) reward_value: &'a Value,
    pub(super) trigger: &'a str,
    pub(super) created_at: DateTime<Utc>,
    pub(super) expires_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a RewardGrant> for RewardGrantRowDto<'a> {
    fn from(grant: &'a RewardGrant) -> Self {
        Self {
            id: grant.id,
            user_id: grant.user_id.as_ref(),
            reward_type: grant.reward_type.as_str(),
            reward_value: &grant.value,
            trigger: &grant.trigger,
            created_at: grant.created_at,
            expires_at: grant.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MilestoneGrantDto {
    pub(super) granted: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct LeagueMembershipRowDto {
    pub(super) tier: String,
}

impl LeagueMembershipRowDto {
    pub(super) fn into_domain_tier(self) -> Result<LeagueTier, String> {
        if self.tier.trim().is_empty() {
            return Err("league membership row has a blank tier".to_owned());
        }
        Ok(LeagueTier::new(self.tier))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LeaderboardRowDto {
    pub(super) user_id: String,
    #[serde(default)]
    pub(super) display_name: Option<String>,
    pub(super) weekly_xp: i64,
}

impl LeaderboardRowDto {
    pub(super) fn into_domain_entry(self) -> Result<LeaderboardEntry, String> {
        let weekly_xp = u64::try_from(self.weekly_xp)
            .map_err(|_| format!("leaderboard row has negative xp {}", self.weekly_xp))?;
        Ok(LeaderboardEntry {
            user_id: parse_user_id(&self.user_id, "leaderboard row")?,
            display_name: self.display_name.unwrap_or_default(),
            weekly_xp,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StreakShieldRowDto {
    pub(super) expires_at: DateTime<Utc>,
}

impl From<StreakShieldRowDto> for StreakShield {
    fn from(row: StreakShieldRowDto) -> Self {
        Self {
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct XpBoostRowDto {
    pub(super) multiplier: f64,
    pub(super) expires_at: DateTime<Utc>,
}

impl XpBoostRowDto {
    pub(super) fn into_domain_boost(self) -> Result<XpBoost, String> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("xp boost row has invalid multiplier {}", self.multiplier));
        }
        Ok(XpBoost {
            multiplier: self.multiplier,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReferralResultDto {
    pub(super) success: bool,
    #[serde(default)]
    pub(super) xp_awarded: Option<i64>,
    #[serde(default)]
    pub(super) reason: Option<String>,
}

impl ReferralResultDto {
    pub(super) fn into_domain_outcome(self) -> Result<ReferralOutcome, String> {
        if self.success {
            let xp = self
                .xp_awarded
                .ok_or_else(|| "successful referral result has no xp_awarded".to_owned())?;
            let xp_awarded = u32::try_from(xp)
                .map_err(|_| format!("referral result has out-of-range xp_awarded {xp}"))?;
            return Ok(ReferralOutcome::Rewarded { xp_awarded });
        }
        let reason = self
            .reason
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| "referral code was not accepted".to_owned());
        Ok(ReferralOutcome::Rejected { reason })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthUserDto {
    pub(super) id: String,
}

impl AuthUserDto {
    pub(super) fn into_domain_user_id(self) -> Result<UserId, String> {
        parse_user_id(&self.id, "auth user")
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RefreshedSessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
}
