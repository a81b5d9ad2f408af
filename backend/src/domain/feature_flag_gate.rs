//! Session-scoped feature flag gate.
//!
//! The gate fetches the platform's flag set once per session and answers
//! lookups from that snapshot. A failed fetch leaves every flag disabled.
//! Percentage rollouts are decided server-side per flag and are checked on
//! demand.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::domain::ports::FeatureFlagSource;
use crate::domain::{FeatureFlagSet, UserId, safe_call};

/// Fail-safe gate over a [`FeatureFlagSource`].
pub struct FeatureFlagGate {
    source: Arc<dyn FeatureFlagSource>,
    user_id: UserId,
    snapshot: RwLock<FeatureFlagSet>,
}

impl FeatureFlagGate {
    /// Create a gate for `user_id`. Every flag reads as disabled until
    /// [`Self::fetch_flags`] succeeds.
    pub fn new(source: Arc<dyn FeatureFlagSource>, user_id: UserId) -> Self {
        Self {
            source,
            user_id,
            snapshot: RwLock::new(FeatureFlagSet::all_disabled()),
        }
    }

    /// Fetch the flag set, cache it and return it.
    ///
    /// Never fails: any remote error yields [`FeatureFlagSet::all_disabled`],
    /// which also replaces whatever was cached before.
    pub async fn fetch_flags(&self) -> FeatureFlagSet {
        let flags = safe_call(
            "fetch_feature_flags",
            self.source.fetch_flags(),
            FeatureFlagSet::all_disabled(),
        )
        .await;
        debug!(
            enabled = ?flags.enabled_names().collect::<Vec<_>>(),
            "feature flags loaded"
        );
        match self.snapshot.write() {
            Ok(mut guard) => *guard = flags.clone(),
            Err(poisoned) => *poisoned.into_inner() = flags.clone(),
        }
        flags
    }

    /// Whether `name` is enabled in the cached snapshot.
    pub fn is_enabled(&self, name: impl AsRef<str>) -> bool {
        match self.snapshot.read() {
            Ok(guard) => guard.is_enabled(name),
            Err(_) => {
                warn!("feature flag snapshot lock poisoned; treating flag as disabled");
                false
            }
        }
    }

    /// Copy of the cached snapshot.
    pub fn snapshot(&self) -> FeatureFlagSet {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(_) => FeatureFlagSet::all_disabled(),
        }
    }

    /// Authoritative per-user rollout decision for `name`; `false` on failure.
    pub async fn check_rollout(&self, name: impl AsRef<str>) -> bool {
        safe_call(
            "check_feature_rollout",
            self.source.check_rollout(name.as_ref(), &self.user_id),
            false,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureFlag;
    use crate::domain::ports::{MockFeatureFlagSource, RemoteError};
    use rstest::rstest;

    fn gate_with(source: MockFeatureFlagSource) -> FeatureFlagGate {
        FeatureFlagGate::new(Arc::new(source), UserId::random())
    }

    #[rstest]
    #[case(RemoteError::transport("dns failure"))]
    #[case(RemoteError::unauthorized("anon key revoked"))]
    #[case(RemoteError::forbidden("rls"))]
    #[case(RemoteError::malformed("flag value was a string"))]
    #[tokio::test]
    async fn fetch_failure_disables_every_flag(#[case] error: RemoteError) {
        let mut source = MockFeatureFlagSource::new();
        source
            .expect_fetch_flags()
            .times(1)
            .return_once(move || Err(error));
        let gate = gate_with(source);

        let flags = gate.fetch_flags().await;

        assert_eq!(flags, FeatureFlagSet::all_disabled());
        for flag in FeatureFlag::ALL {
            assert!(!gate.is_enabled(flag));
        }
        assert!(!gate.is_enabled("enable_unknown"));
    }

    #[rstest]
    #[tokio::test]
    async fn failed_refetch_replaces_previous_snapshot() {
        let mut source = MockFeatureFlagSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_flags()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|| Ok(FeatureFlagSet::from_pairs([("enable_leagues", true)])));
        source
            .expect_fetch_flags()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|| Err(RemoteError::transport("offline")));
        let gate = gate_with(source);

        gate.fetch_flags().await;
        assert!(gate.is_enabled(FeatureFlag::Leagues));

        gate.fetch_flags().await;
        assert!(!gate.is_enabled(FeatureFlag::Leagues));
    }

    #[rstest]
    #[tokio::test]
    async fn flags_are_disabled_before_first_fetch() {
        let gate = gate_with(MockFeatureFlagSource::new());
        assert_eq!(gate.snapshot(), FeatureFlagSet::all_disabled());
        assert!(!gate.is_enabled(FeatureFlag::Premium));
    }

    #[rstest]
    #[case(Ok(true), true)]
    #[case(Ok(false), false)]
    #[case(Err(RemoteError::transport("timeout")), false)]
    #[tokio::test]
    async fn rollout_check_defaults_to_disabled(
        #[case] answer: Result<bool, RemoteError>,
        #[case] expected: bool,
    ) {
        let user = UserId::random();
        let expected_user = user.clone();
        let mut source = MockFeatureFlagSource::new();
        source
            .expect_check_rollout()
            .withf(move |flag, user_id| flag == "enable_teams" && *user_id == expected_user)
            .times(1)
            .return_once(move |_, _| answer);
        let gate = FeatureFlagGate::new(Arc::new(source), user);

        assert_eq!(gate.check_rollout(FeatureFlag::Teams).await, expected);
    }
}
