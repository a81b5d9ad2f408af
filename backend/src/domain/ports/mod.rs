//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_verifier;
mod admin_directory;
mod entitlement_repository;
mod error_reporter;
mod feature_flag_source;
mod key_value_store;
mod league_repository;
mod notification_sink;
mod protection_repository;
mod referral_ledger;
mod remote_error;
mod reward_repository;

#[cfg(test)]
pub use access_token_verifier::MockAccessTokenVerifier;
pub use access_token_verifier::{AccessTokenVerifier, FixtureAccessTokenVerifier};
#[cfg(test)]
pub use admin_directory::MockAdminDirectory;
pub use admin_directory::{AdminDirectory, FixtureAdminDirectory};
pub use entitlement_repository::{
    AuthSession, EntitlementRepository, FixtureAuthSession, FixtureEntitlementRepository,
};
#[cfg(test)]
pub use entitlement_repository::{MockAuthSession, MockEntitlementRepository};
#[cfg(test)]
pub use error_reporter::MockErrorReporter;
pub use error_reporter::{ErrorReporter, FeatureErrorReport, NoOpErrorReporter};
#[cfg(test)]
pub use feature_flag_source::MockFeatureFlagSource;
pub use feature_flag_source::{FeatureFlagSource, FixtureFeatureFlagSource};
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore, KeyValueStoreError};
pub use league_repository::LeagueRepository;
#[cfg(test)]
pub use league_repository::MockLeagueRepository;
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{ChannelNotificationSink, NoOpNotificationSink, NotificationSink};
#[cfg(test)]
pub use protection_repository::MockProtectionRepository;
pub use protection_repository::ProtectionRepository;
#[cfg(test)]
pub use referral_ledger::MockReferralLedger;
pub use referral_ledger::{FixtureReferralLedger, ReferralLedger};
pub use remote_error::RemoteError;
#[cfg(test)]
pub use reward_repository::MockRewardRepository;
pub use reward_repository::{FixtureRewardRepository, RewardRepository};
