//! Stateful port doubles shared by the session behaviour suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline::domain::ports::{
    AuthSession, EntitlementRepository, ErrorReporter, FeatureErrorReport, FeatureFlagSource,
    LeagueRepository, ProtectionRepository, RemoteError, RewardRepository,
};
use questline::domain::{
    ApprovedPaymentProof, FeatureFlagSet, LeaderboardEntry, LeagueTier, MilestoneGrant,
    RewardGrant, RewardType, StreakShield, SubscriptionRecord, SubscriptionStatus, UserId,
    XpBoost,
};
use uuid::Uuid;

/// Flag source that keeps answering with one scripted result.
///
/// Rollout checks follow the published set unless a flag is withheld.
pub(crate) struct ScriptedFlagSource {
    answer: Result<FeatureFlagSet, RemoteError>,
    withheld: Vec<String>,
}

impl ScriptedFlagSource {
    pub(crate) fn publishing(flags: FeatureFlagSet) -> Self {
        Self {
            answer: Ok(flags),
            withheld: Vec::new(),
        }
    }

    pub(crate) fn failing(error: RemoteError) -> Self {
        Self {
            answer: Err(error),
            withheld: Vec::new(),
        }
    }

    pub(crate) fn withholding(mut self, flags: Vec<String>) -> Self {
        self.withheld = flags;
        self
    }
}

#[async_trait]
impl FeatureFlagSource for ScriptedFlagSource {
    async fn fetch_flags(&self) -> Result<FeatureFlagSet, RemoteError> {
        self.answer.clone()
    }

    async fn check_rollout(&self, flag: &str, _user_id: &UserId) -> Result<bool, RemoteError> {
        self.answer
            .as_ref()
            .map(|flags| flags.is_enabled(flag) && !self.withheld.iter().any(|name| name == flag))
            .map_err(Clone::clone)
    }
}

#[derive(Default)]
pub(crate) struct RecordingReporter {
    reports: Mutex<Vec<FeatureErrorReport>>,
}

impl RecordingReporter {
    pub(crate) fn reports(&self) -> Vec<FeatureErrorReport> {
        self.reports.lock().expect("reports lock").clone()
    }
}

#[async_trait]
impl ErrorReporter for RecordingReporter {
    async fn report(&self, report: &FeatureErrorReport) -> Result<(), RemoteError> {
        self.reports.lock().expect("reports lock").push(report.clone());
        Ok(())
    }
}

/// Reward ledger answering the grant procedure from a script.
///
/// Once the script runs out every further grant answers `granted: false`.
#[derive(Default)]
pub(crate) struct ScriptedRewardRepository {
    answers: Mutex<VecDeque<bool>>,
    grant_calls: Mutex<Vec<u32>>,
    inserted: Mutex<Vec<RewardGrant>>,
}

impl ScriptedRewardRepository {
    pub(crate) fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn grant_calls(&self) -> Vec<u32> {
        self.grant_calls.lock().expect("grant calls lock").clone()
    }

    pub(crate) fn inserted(&self) -> Vec<RewardGrant> {
        self.inserted.lock().expect("inserted lock").clone()
    }
}

#[async_trait]
impl RewardRepository for ScriptedRewardRepository {
    async fn grant_streak_reward(
        &self,
        _user_id: &UserId,
        streak_count: u32,
    ) -> Result<MilestoneGrant, RemoteError> {
        self.grant_calls
            .lock()
            .expect("grant calls lock")
            .push(streak_count);
        let granted = self
            .answers
            .lock()
            .expect("answers lock")
            .pop_front()
            .unwrap_or(false);
        Ok(MilestoneGrant { granted })
    }

    async fn grant_exists_since(
        &self,
        user_id: &UserId,
        reward_type: RewardType,
        since: DateTime<Utc>,
    ) -> Result<bool, RemoteError> {
        Ok(self.inserted().iter().any(|grant| {
            &grant.user_id == user_id && grant.reward_type == reward_type && grant.created_at >= since
        }))
    }

    async fn insert_grant(&self, grant: &RewardGrant) -> Result<(), RemoteError> {
        self.inserted
            .lock()
            .expect("inserted lock")
            .push(grant.clone());
        Ok(())
    }
}

/// Entitlement rows held in memory, keyed the way the platform keys them.
#[derive(Default)]
pub(crate) struct InMemoryEntitlements {
    proof: Option<ApprovedPaymentProof>,
    premium: Mutex<bool>,
    subscriptions: Mutex<Vec<SubscriptionRecord>>,
}

impl InMemoryEntitlements {
    /// A user whose payment was approved but whose profile never flipped.
    pub(crate) fn paid_but_not_premium(user_id: &UserId, submitted_at: DateTime<Utc>) -> Self {
        Self {
            proof: Some(ApprovedPaymentProof {
                id: Uuid::new_v4(),
                user_id: user_id.clone(),
                submitted_at,
            }),
            ..Self::default()
        }
    }

    pub(crate) fn is_premium(&self) -> bool {
        *self.premium.lock().expect("premium lock")
    }

    pub(crate) fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.subscriptions.lock().expect("subscriptions lock").clone()
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlements {
    async fn latest_approved_payment_proof(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ApprovedPaymentProof>, RemoteError> {
        Ok(self
            .proof
            .clone()
            .filter(|proof| &proof.user_id == user_id))
    }

    async fn premium_status(&self, _user_id: &UserId) -> Result<bool, RemoteError> {
        Ok(self.is_premium())
    }

    async fn set_premium_status(
        &self,
        _user_id: &UserId,
        premium: bool,
    ) -> Result<(), RemoteError> {
        *self.premium.lock().expect("premium lock") = premium;
        Ok(())
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<(), RemoteError> {
        let mut rows = self.subscriptions.lock().expect("subscriptions lock");
        rows.retain(|row| row.user_id != record.user_id);
        rows.push(record.clone());
        Ok(())
    }

    async fn subscription_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionStatus>, RemoteError> {
        Ok(self
            .subscriptions()
            .iter()
            .find(|row| &row.user_id == user_id)
            .map(SubscriptionRecord::status))
    }
}

#[derive(Default)]
pub(crate) struct CountingAuthSession {
    refreshes: AtomicUsize,
}

impl CountingAuthSession {
    pub(crate) fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthSession for CountingAuthSession {
    async fn refresh_session(&self) -> Result<(), RemoteError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// League data fixed for the whole scenario.
#[derive(Default)]
pub(crate) struct StaticLeagues {
    tier: Option<LeagueTier>,
    board: Vec<LeaderboardEntry>,
}

impl StaticLeagues {
    pub(crate) fn new(tier: LeagueTier, board: Vec<LeaderboardEntry>) -> Self {
        Self {
            tier: Some(tier),
            board,
        }
    }
}

#[async_trait]
impl LeagueRepository for StaticLeagues {
    async fn league_tier(&self, _user_id: &UserId) -> Result<Option<LeagueTier>, RemoteError> {
        Ok(self.tier.clone())
    }

    async fn leaderboard(
        &self,
        tier: &LeagueTier,
        _period_start: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        if self.tier.as_ref() == Some(tier) {
            Ok(self.board.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// No shields and no boosts.
pub(crate) struct NoProtection;

#[async_trait]
impl ProtectionRepository for NoProtection {
    async fn active_shield(&self, _user_id: &UserId) -> Result<Option<StreakShield>, RemoteError> {
        Ok(None)
    }

    async fn active_xp_boost(&self, _user_id: &UserId) -> Result<Option<XpBoost>, RemoteError> {
        Ok(None)
    }
}
